//! Open-data CSV exports, grouped into one record per institution.
//!
//! Each export has one row per review. Rows are grouped by `Institution Code` in
//! first-seen order, and averages and school attributes are derived once per group.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::config::IngestConfig;
use crate::dynamo::Item;
use crate::error::{AppError, AppResult};
use crate::model::{
    grade_number, Institute, ProgrammeReview, Review, School, University, VocationalInstitute,
};
use crate::query::round2;

pub const CSV_PREFIX: &str = "CSVFiles/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dataset {
    GovernmentSchools,
    PrivateSchools,
    Vocational,
    HigherEducation,
}

impl Dataset {
    /// Recognises the export by its object key.
    pub fn from_key(key: &str) -> Option<Self> {
        let name = key.strip_prefix(CSV_PREFIX)?;
        match name {
            "Results of Government Schools Reviews.csv" => Some(Dataset::GovernmentSchools),
            "Results of Private Schools Reviews.csv" => Some(Dataset::PrivateSchools),
            "Results of Vocational Reviews.csv" => Some(Dataset::Vocational),
            "Results of Higher Education Reviews.csv" => Some(Dataset::HigherEducation),
            _ => None,
        }
    }

    pub fn table<'a>(&self, config: &'a IngestConfig) -> AppResult<&'a str> {
        let (table, variable) = match self {
            Dataset::GovernmentSchools | Dataset::PrivateSchools => {
                (&config.school_table, "SCHOOL_REVIEWS_TABLE_NAME")
            }
            Dataset::Vocational => (&config.vocational_table, "VOCATIONAL_REVIEWS_TABLE_NAME"),
            Dataset::HigherEducation => {
                (&config.university_table, "UNIVERSITY_REVIEWS_TABLE_NAME")
            }
        };
        table.as_deref().ok_or(AppError::MissingConfig(variable))
    }

    /// Parses the export into table items.
    pub fn records(&self, csv_bytes: &[u8]) -> AppResult<Vec<Item>> {
        let items = match self {
            Dataset::GovernmentSchools => to_items(parse_schools(csv_bytes, SchoolType::Government)?),
            Dataset::PrivateSchools => to_items(parse_schools(csv_bytes, SchoolType::Private)?),
            Dataset::Vocational => to_items(parse_vocational(csv_bytes)?),
            Dataset::HigherEducation => to_items(parse_universities(csv_bytes)?),
        };
        Ok(items)
    }
}

fn to_items<I: Institute>(records: Vec<I>) -> Vec<Item> {
    records.iter().map(Institute::to_item).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchoolType {
    Government,
    Private,
}

impl SchoolType {
    fn as_str(&self) -> &'static str {
        match self {
            SchoolType::Government => "Government",
            SchoolType::Private => "Private",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    #[serde(rename = "Institution Code", default)]
    institution_code: String,
    #[serde(
        rename = "School Name E",
        alias = "Institution Name E",
        alias = "Institution NameE",
        default
    )]
    english_name: String,
    #[serde(rename = "School Name A", alias = "Institution Name A", default)]
    arabic_name: String,
    #[serde(rename = "Cycle", default)]
    cycle: String,
    #[serde(rename = "Batch", default)]
    batch: String,
    #[serde(rename = "Batch Release Date", default)]
    batch_release_date: String,
    #[serde(rename = "Review Type", default)]
    review_type: String,
    #[serde(rename = "Grade", default)]
    grade: String,
}

impl ReviewRow {
    fn review(&self) -> Review {
        Review {
            cycle: self.cycle.trim().to_string(),
            batch: self.batch.trim().to_string(),
            batch_release_date: self.batch_release_date.trim().to_string(),
            review_type: self.review_type.trim().to_string(),
            grade: self.grade.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UniversityRow {
    #[serde(rename = "Institution Code", default)]
    institution_code: String,
    #[serde(rename = "Institution Name E", default)]
    english_name: String,
    #[serde(rename = "Institution Name A", default)]
    arabic_name: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Program", default)]
    program: String,
    #[serde(rename = "Unified Study field", default)]
    unified_study_field: String,
    #[serde(rename = "Cycle", default)]
    cycle: String,
    #[serde(rename = "Type", default)]
    review_type: String,
    #[serde(rename = "Judgement", default)]
    judgement: String,
    #[serde(rename = "Report File", default)]
    report_file: String,
}

impl UniversityRow {
    fn review(&self) -> ProgrammeReview {
        ProgrammeReview {
            title: self.title.trim().to_string(),
            program: self.program.trim().to_string(),
            unified_study_field: self.unified_study_field.trim().to_string(),
            cycle: self.cycle.trim().to_string(),
            review_type: self.review_type.trim().to_string(),
            judgement: self.judgement.trim().to_string(),
            report_file: self.report_file.trim().to_string(),
        }
    }
}

/// Rows that fail to decode are logged and skipped.
fn read_rows<R: DeserializeOwned>(csv_bytes: &[u8]) -> Vec<R> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(csv_bytes);

    reader
        .deserialize::<R>()
        .enumerate()
        .filter_map(|(index, row)| match row {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(row = index + 1, error = %e, "skipping unreadable CSV row");
                None
            }
        })
        .collect()
}

/// Groups rows by trimmed institution code, keeping first-seen order. Rows without a
/// code are dropped.
fn group_rows<R>(rows: Vec<R>, code: impl Fn(&R) -> &str) -> Vec<(String, Vec<R>)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<R>)> = Vec::new();

    for row in rows {
        let key = code(&row).trim().to_string();
        if key.is_empty() {
            continue;
        }
        match positions.get(&key) {
            Some(&index) => groups[index].1.push(row),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }
    groups
}

fn ensure_header(csv_bytes: &[u8]) -> AppResult<()> {
    let mut reader = csv::Reader::from_reader(csv_bytes);
    let headers = reader
        .headers()
        .map_err(|e| AppError::invalid(format!("unreadable CSV header: {e}")))?;
    if headers.iter().any(|h| h.trim() == "Institution Code") {
        Ok(())
    } else {
        Err(AppError::invalid("CSV has no Institution Code column"))
    }
}

pub fn parse_schools(csv_bytes: &[u8], school_type: SchoolType) -> AppResult<Vec<School>> {
    ensure_header(csv_bytes)?;
    let rows: Vec<ReviewRow> = read_rows(csv_bytes);

    Ok(group_rows(rows, |r| r.institution_code.as_str())
        .into_iter()
        .map(|(code, rows)| {
            let english = rows[0].english_name.trim().to_string();
            let arabic = rows[0].arabic_name.trim().to_string();
            let reviews: Vec<Review> = rows.iter().map(ReviewRow::review).collect();

            let (school_level, school_gender) = match school_type {
                SchoolType::Government => (
                    school_level(&english).or_else(|| school_level_arabic(&arabic)),
                    school_gender(&english).or_else(|| school_gender_arabic(&arabic)),
                ),
                SchoolType::Private => (None, None),
            };

            School {
                institution_code: code,
                average_grade: average_grade(&reviews, |t| t == "Review Report"),
                english_school_name: english,
                arabic_school_name: arabic,
                school_type: school_type.as_str().to_string(),
                reviews,
                school_level,
                school_gender,
            }
        })
        .collect())
}

pub fn parse_vocational(csv_bytes: &[u8]) -> AppResult<Vec<VocationalInstitute>> {
    ensure_header(csv_bytes)?;
    let rows: Vec<ReviewRow> = read_rows(csv_bytes);

    Ok(group_rows(rows, |r| r.institution_code.as_str())
        .into_iter()
        .map(|(code, rows)| {
            let reviews: Vec<Review> = rows.iter().map(ReviewRow::review).collect();
            VocationalInstitute {
                institution_code: code,
                english_institute_name: rows[0].english_name.trim().to_string(),
                arabic_institute_name: rows[0].arabic_name.trim().to_string(),
                average_grade: average_grade(&reviews, |t| {
                    t.contains("Review") || t.contains("Repeat review")
                }),
                reviews,
            }
        })
        .collect())
}

pub fn parse_universities(csv_bytes: &[u8]) -> AppResult<Vec<University>> {
    ensure_header(csv_bytes)?;
    let rows: Vec<UniversityRow> = read_rows(csv_bytes);

    Ok(group_rows(rows, |r| r.institution_code.as_str())
        .into_iter()
        .map(|(code, rows)| {
            let reviews: Vec<ProgrammeReview> = rows.iter().map(UniversityRow::review).collect();
            let judgements: Vec<u32> = reviews
                .iter()
                .filter(|r| r.review_type.to_lowercase().contains("review"))
                .filter_map(|r| grade_number(&r.judgement))
                .collect();
            University {
                institution_code: code,
                english_institute_name: rows[0].english_name.trim().to_string(),
                arabic_institute_name: rows[0].arabic_name.trim().to_string(),
                average_judgement: mean(&judgements),
                reviews,
            }
        })
        .collect())
}

/// Mean of the `(n)` grades among reviews whose type passes `counts`, to two decimals.
fn average_grade(reviews: &[Review], counts: impl Fn(&str) -> bool) -> Option<f64> {
    let grades: Vec<u32> = reviews
        .iter()
        .filter(|r| counts(&r.review_type))
        .filter_map(|r| grade_number(&r.grade))
        .collect();
    mean(&grades)
}

fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: u32 = values.iter().sum();
    Some(round2(f64::from(sum) / values.len() as f64))
}

const LEVELS: [&str; 3] = ["Primary", "Intermediate", "Secondary"];

const ARABIC_LEVELS: [(&str, &str); 3] = [
    ("الابتدائية", "Primary"),
    ("الإعدادية", "Intermediate"),
    ("الثانوية", "Secondary"),
];

/// Every level named in the English school name, comma-joined.
fn school_level(english: &str) -> Option<String> {
    let lower = english.to_lowercase();
    let found: Vec<&str> = LEVELS
        .iter()
        .copied()
        .filter(|level| lower.contains(&level.to_lowercase()))
        .collect();
    (!found.is_empty()).then(|| found.join(","))
}

fn school_level_arabic(arabic: &str) -> Option<String> {
    ARABIC_LEVELS
        .iter()
        .find(|(word, _)| arabic.contains(word))
        .map(|(_, level)| level.to_string())
}

fn school_gender(english: &str) -> Option<String> {
    let lower = english.to_lowercase();
    ["Boys", "Girls"]
        .into_iter()
        .find(|gender| lower.contains(&gender.to_lowercase()))
        .map(str::to_string)
}

fn school_gender_arabic(arabic: &str) -> Option<String> {
    if arabic.contains("بنين") {
        Some("Boys".to_string())
    } else if arabic.contains("بنات") {
        Some("Girls".to_string())
    } else {
        None
    }
}
