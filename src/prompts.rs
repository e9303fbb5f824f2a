//! Per-category prompts for report metadata extraction, and parsing of the model reply.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::classify::ReportCategory;
use crate::error::{AppError, AppResult};

/// One requested output key and the table attribute it is stored under.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub label: &'static str,
    pub attribute: &'static str,
    pub hint: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct PromptTemplate {
    pub category: ReportCategory,
    pub fields: &'static [Field],
    pub example: &'static str,
}

const SCHOOL_FIELDS: &[Field] = &[
    Field {
        label: "Institute Name",
        attribute: "instituteName",
        hint: "The name of the institute, excluding the words Education and Training Quality Authority.",
    },
    Field {
        label: "Institute Classification",
        attribute: "instituteClassification",
        hint: "Private only if the report says the school is private, otherwise Government.",
    },
    Field {
        label: "Date of Review",
        attribute: "dateOfReview",
        hint: "The date of the review.",
    },
    Field {
        label: "Overall Effectiveness",
        attribute: "overallEffectiveness",
        hint: "1 means Outstanding, 2 Good, 3 Satisfactory, 4 Inadequate.",
    },
    Field {
        label: "Location",
        attribute: "instituteLocation",
        hint: "The governorate only, without the town.",
    },
    Field {
        label: "Grades In School",
        attribute: "instituteGradeLevels",
        hint: "Primary, Intermediate or Secondary, ignoring text such as 'Grades e.g. 1 to 12'.",
    },
];

const UNIVERSITY_FIELDS: &[Field] = &[
    Field {
        label: "Institution Name",
        attribute: "universityName",
        hint: "The institution name, excluding phrases like Education & Training Quality Authority.",
    },
    Field {
        label: "Location",
        attribute: "universityLocation",
        hint: "The institution's location in the Kingdom of Bahrain.",
    },
];

const PROGRAMME_FIELDS: &[Field] = &[
    Field {
        label: "University Name",
        attribute: "universityName",
        hint: "The university offering the programme.",
    },
    Field {
        label: "Programme Name",
        attribute: "programmeName",
        hint: "The name of the reviewed programme.",
    },
    Field {
        label: "Programme Judgment",
        attribute: "programmeJudgment",
        hint: "The overall judgment, e.g. Confidence or Limited Confidence.",
    },
];

const VOCATIONAL_FIELDS: &[Field] = &[
    Field {
        label: "Vocational Training center",
        attribute: "vocationalCenterName",
        hint: "The name of the training centre.",
    },
    Field {
        label: "Vocational Location",
        attribute: "vocationalCenterLocation",
        hint: "The town or governorate of the centre.",
    },
    Field {
        label: "Date of Review",
        attribute: "dateOfReview",
        hint: "The date of the review.",
    },
];

const SCHOOL_EXAMPLE: &str = r#"Input: Jidhafs Secondary Girls School located in Jidhafs Capital Governorate in Bahrain. It includes levels from 10-12. The school overall effectiveness is 3: Satisfactory according to the report date of review on 30 April and 2-3 May 2018.
Output: {"Institute Name": "Jidhafs Secondary Girls School", "Institute Classification": "Government", "Date of Review": "30 April and 2-3 May 2018", "Overall Effectiveness": "3: Satisfactory", "Location": "Capital Governorate", "Grades In School": "Secondary"}"#;

const UNIVERSITY_EXAMPLE: &str =
    r#"Output: {"Institution Name": "University of Bahrain", "Location": "Sakhir"}"#;

const PROGRAMME_EXAMPLE: &str = r#"Output: {"University Name": "Bahrain Polytechnic", "Programme Name": "Information Technology", "Programme Judgment": "Confidence"}"#;

const VOCATIONAL_EXAMPLE: &str = r#"Output: {"Vocational Training center": "Agora Training Centre", "Vocational Location": "Manama", "Date of Review": "08-12 October 2023"}"#;

pub fn template_for(category: ReportCategory) -> AppResult<PromptTemplate> {
    let (fields, example) = match category {
        ReportCategory::School => (SCHOOL_FIELDS, SCHOOL_EXAMPLE),
        ReportCategory::University => (UNIVERSITY_FIELDS, UNIVERSITY_EXAMPLE),
        ReportCategory::Programme => (PROGRAMME_FIELDS, PROGRAMME_EXAMPLE),
        ReportCategory::VocationalCentre => (VOCATIONAL_FIELDS, VOCATIONAL_EXAMPLE),
        ReportCategory::Unknown => {
            return Err(AppError::invalid("no prompt exists for unknown reports"))
        }
    };
    Ok(PromptTemplate {
        category,
        fields,
        example,
    })
}

impl PromptTemplate {
    pub fn render(&self, report_text: &str) -> String {
        let schema = self
            .fields
            .iter()
            .map(|f| format!("  \"{}\": String // {}", f.label, f.hint))
            .collect::<Vec<_>>()
            .join("\n");
        let empty = self
            .fields
            .iter()
            .map(|f| format!("\"{}\": \"\"", f.label))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Your goal is to extract structured information from the user's input that matches the form described below.\n\
             Do not add any attributes that do not appear in the schema. Include every key, even when the value is unknown.\n\
             \n\
             request: {{\n{schema}\n}}\n\
             \n\
             Output the extracted information as a single JSON object and nothing else.\n\
             \n\
             {example}\n\
             \n\
             Input: <data>{report_text}</data>\n\
             Output: {{{empty}}}",
            example = self.example,
        )
    }

    /// Maps the model's keys onto table attributes; unrequested keys are dropped.
    pub fn attributes(&self, reply: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|field| {
                let value = reply.get(field.label)?;
                let text = match value {
                    Value::String(s) => s.trim().to_string(),
                    Value::Null => return None,
                    other => other.to_string(),
                };
                Some((field.attribute.to_string(), text))
            })
            .collect()
    }
}

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*?\}").expect("valid regex"));

/// Decodes the first `{...}` object in the model's raw reply.
pub fn parse_model_json(raw: &str) -> AppResult<serde_json::Map<String, Value>> {
    let found = JSON_OBJECT
        .find(raw)
        .ok_or_else(|| AppError::ModelOutput("no JSON object in model reply".into()))?;

    match serde_json::from_str::<Value>(found.as_str()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::ModelOutput("model reply is not a JSON object".into())),
        Err(e) => Err(AppError::ModelOutput(e.to_string())),
    }
}
