//! Keyword classification of extracted report text.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportCategory {
    School,
    University,
    Programme,
    VocationalCentre,
    Unknown,
}

const SCHOOL_PHRASES: &[&str] = &[
    "schools reviews",
    "the school's overall effectiveness",
    "the school\u{2019}s overall effectiveness",
    "intermediate boys",
    "intermediate girls",
    "primary girls",
    "primary boys",
    "secondary boys",
    "secondary girls",
    "private schools",
    "schools & kindergartens reviews",
];

const UNIVERSITY_PHRASES: &[&str] = &["institutional review report", "institution profile"];

const PROGRAMME_PHRASES: &[&str] = &[
    "programmes-within-college reviews",
    "programme review report",
    "degree in",
    "bachelor in",
    "college of",
];

const VOCATIONAL_PHRASES: &[&str] = &[
    "training centre",
    "vocational reviews",
    "directorate of vocational reviews",
];

/// Checked in order; the first category with a matching phrase wins.
const PRECEDENCE: &[(ReportCategory, &[&str])] = &[
    (ReportCategory::School, SCHOOL_PHRASES),
    (ReportCategory::University, UNIVERSITY_PHRASES),
    (ReportCategory::Programme, PROGRAMME_PHRASES),
    (ReportCategory::VocationalCentre, VOCATIONAL_PHRASES),
];

pub fn classify_report(text: &str) -> ReportCategory {
    let lower = text.to_lowercase();
    PRECEDENCE
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| lower.contains(phrase)))
        .map(|(category, _)| *category)
        .unwrap_or(ReportCategory::Unknown)
}

impl ReportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::School => "school",
            ReportCategory::University => "university",
            ReportCategory::Programme => "programme",
            ReportCategory::VocationalCentre => "vocationalCentre",
            ReportCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
