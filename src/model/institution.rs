use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dates::parse_release_date;
use crate::dynamo::{
    first_string_attr, item, list_of_maps, map_list, number_attr, opt_n, opt_string_attr, s,
    string_attr, Item,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstituteKind {
    School,
    University,
    Vocational,
}

impl InstituteKind {
    pub fn noun(&self) -> &'static str {
        match self {
            InstituteKind::School => "school",
            InstituteKind::University => "university",
            InstituteKind::Vocational => "institute",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            InstituteKind::School => "schools",
            InstituteKind::University => "universities",
            InstituteKind::Vocational => "institutes",
        }
    }
}

/// A graded review of a school or vocational institute.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Review {
    pub cycle: String,
    pub batch: String,
    pub batch_release_date: String,
    pub review_type: String,
    pub grade: String,
}

impl Review {
    pub fn from_item(map: &Item) -> Self {
        Self {
            cycle: string_attr(map, "Cycle"),
            batch: string_attr(map, "Batch"),
            batch_release_date: string_attr(map, "BatchReleaseDate"),
            review_type: string_attr(map, "ReviewType"),
            grade: string_attr(map, "Grade"),
        }
    }

    pub fn to_item(&self) -> Item {
        item([
            ("Cycle", s(&self.cycle)),
            ("Batch", s(&self.batch)),
            ("BatchReleaseDate", s(&self.batch_release_date)),
            ("ReviewType", s(&self.review_type)),
            ("Grade", s(&self.grade)),
        ])
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        parse_release_date(&self.batch_release_date)
    }
}

static GRADE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\((\d+)\)").expect("valid regex"));

/// Numeric grade from a label such as `"(2) Good"`.
pub fn grade_number(label: &str) -> Option<u32> {
    GRADE_PREFIX
        .captures(label)
        .and_then(|caps| caps[1].parse().ok())
}

/// What the aggregate queries need from any review shape.
pub trait ReviewRecord {
    fn cycle(&self) -> &str;
    fn grade(&self) -> Option<u32>;
    fn release_date(&self) -> Option<NaiveDate>;
}

impl ReviewRecord for Review {
    fn cycle(&self) -> &str {
        &self.cycle
    }

    fn grade(&self) -> Option<u32> {
        grade_number(&self.grade)
    }

    fn release_date(&self) -> Option<NaiveDate> {
        Review::release_date(self)
    }
}

/// A programme or institutional review of a university.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProgrammeReview {
    pub title: String,
    pub program: String,
    pub unified_study_field: String,
    pub cycle: String,
    #[serde(rename = "Type")]
    pub review_type: String,
    pub judgement: String,
    pub report_file: String,
}

impl ProgrammeReview {
    pub fn from_item(map: &Item) -> Self {
        Self {
            title: string_attr(map, "Title"),
            program: string_attr(map, "Program"),
            unified_study_field: string_attr(map, "UnifiedStudyField"),
            cycle: string_attr(map, "Cycle"),
            review_type: string_attr(map, "Type"),
            judgement: string_attr(map, "Judgement"),
            report_file: string_attr(map, "ReportFile"),
        }
    }

    pub fn to_item(&self) -> Item {
        item([
            ("Title", s(&self.title)),
            ("Program", s(&self.program)),
            ("UnifiedStudyField", s(&self.unified_study_field)),
            ("Cycle", s(&self.cycle)),
            ("Type", s(&self.review_type)),
            ("Judgement", s(&self.judgement)),
            ("ReportFile", s(&self.report_file)),
        ])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct School {
    pub institution_code: String,
    pub english_school_name: String,
    pub arabic_school_name: String,
    pub school_type: String,
    pub reviews: Vec<Review>,
    pub average_grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_gender: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VocationalInstitute {
    pub institution_code: String,
    pub english_institute_name: String,
    pub arabic_institute_name: String,
    pub reviews: Vec<Review>,
    pub average_grade: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct University {
    pub institution_code: String,
    pub english_institute_name: String,
    pub arabic_institute_name: String,
    pub reviews: Vec<ProgrammeReview>,
    pub average_judgement: Option<f64>,
}

/// Entry returned by `compareSpecific` for graded institutes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReview {
    pub name: String,
    pub latest_review: Option<Review>,
}

/// Entry returned by `compareSpecific` for universities, which carry no release dates.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewList<R> {
    pub name: String,
    pub reviews: Vec<R>,
}

/// Common read-side behaviour of the three institution tables.
pub trait Institute: Serialize + Send + Sync + Sized {
    type Review: ReviewRecord + Serialize + Clone + Send + Sync;
    type Comparison: Serialize;

    const KIND: InstituteKind;

    fn from_item(item: &Item) -> Self;
    fn to_item(&self) -> Item;

    fn english_name(&self) -> &str;
    fn arabic_name(&self) -> &str;
    fn reviews(&self) -> &[Self::Review];
    fn comparison(&self) -> Self::Comparison;

    /// Only schools carry a government/private type.
    fn as_school(&self) -> Option<&School> {
        None
    }

    /// Case-insensitive on the English name, exact on the Arabic name.
    fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.english_name().to_lowercase() == name.to_lowercase() || self.arabic_name() == name
    }
}

/// Most recent review by parsed release date; undated reviews rank last and ties keep
/// the earlier entry.
pub fn latest_review(reviews: &[Review]) -> Option<&Review> {
    reviews
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.release_date()
                .cmp(&b.release_date())
                .then_with(|| ib.cmp(ia))
        })
        .map(|(_, review)| review)
}

fn review_items<R>(reviews: &[R], to_item: impl Fn(&R) -> Item) -> Item {
    item([("Reviews", list_of_maps(reviews.iter().map(to_item).collect()))])
}

impl ReviewRecord for ProgrammeReview {
    fn cycle(&self) -> &str {
        &self.cycle
    }

    fn grade(&self) -> Option<u32> {
        grade_number(&self.judgement)
    }

    /// University exports carry no release date.
    fn release_date(&self) -> Option<NaiveDate> {
        None
    }
}

impl Institute for School {
    type Review = Review;
    type Comparison = LatestReview;

    const KIND: InstituteKind = InstituteKind::School;

    fn from_item(record: &Item) -> Self {
        Self {
            institution_code: string_attr(record, "InstitutionCode"),
            english_school_name: string_attr(record, "EnglishSchoolName"),
            arabic_school_name: string_attr(record, "ArabicSchoolName"),
            school_type: string_attr(record, "SchoolType"),
            reviews: map_list(record.get("Reviews"), Review::from_item),
            average_grade: number_attr(record, "AverageGrade"),
            school_level: opt_string_attr(record, "SchoolLevel"),
            school_gender: opt_string_attr(record, "SchoolGender"),
        }
    }

    fn to_item(&self) -> Item {
        let mut record = item([
            ("InstitutionCode", s(&self.institution_code)),
            ("EnglishSchoolName", s(&self.english_school_name)),
            ("ArabicSchoolName", s(&self.arabic_school_name)),
            ("SchoolType", s(&self.school_type)),
            ("AverageGrade", opt_n(self.average_grade)),
        ]);
        record.extend(review_items(&self.reviews, Review::to_item));
        if let Some(level) = &self.school_level {
            record.insert("SchoolLevel".into(), s(level));
        }
        if let Some(gender) = &self.school_gender {
            record.insert("SchoolGender".into(), s(gender));
        }
        record
    }

    fn english_name(&self) -> &str {
        &self.english_school_name
    }

    fn arabic_name(&self) -> &str {
        &self.arabic_school_name
    }

    fn as_school(&self) -> Option<&School> {
        Some(self)
    }

    fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    fn comparison(&self) -> LatestReview {
        LatestReview {
            name: self.english_school_name.clone(),
            latest_review: latest_review(&self.reviews).cloned(),
        }
    }
}

impl Institute for VocationalInstitute {
    type Review = Review;
    type Comparison = LatestReview;

    const KIND: InstituteKind = InstituteKind::Vocational;

    fn from_item(record: &Item) -> Self {
        Self {
            institution_code: string_attr(record, "InstitutionCode"),
            english_institute_name: string_attr(record, "EnglishInstituteName"),
            arabic_institute_name: string_attr(record, "ArabicInstituteName"),
            reviews: map_list(record.get("Reviews"), Review::from_item),
            average_grade: number_attr(record, "AverageGrade"),
        }
    }

    fn to_item(&self) -> Item {
        let mut record = item([
            ("InstitutionCode", s(&self.institution_code)),
            ("EnglishInstituteName", s(&self.english_institute_name)),
            ("ArabicInstituteName", s(&self.arabic_institute_name)),
            ("AverageGrade", opt_n(self.average_grade)),
        ]);
        record.extend(review_items(&self.reviews, Review::to_item));
        record
    }

    fn english_name(&self) -> &str {
        &self.english_institute_name
    }

    fn arabic_name(&self) -> &str {
        &self.arabic_institute_name
    }

    fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    fn comparison(&self) -> LatestReview {
        LatestReview {
            name: self.english_institute_name.clone(),
            latest_review: latest_review(&self.reviews).cloned(),
        }
    }
}

impl Institute for University {
    type Review = ProgrammeReview;
    type Comparison = ReviewList<ProgrammeReview>;

    const KIND: InstituteKind = InstituteKind::University;

    fn from_item(record: &Item) -> Self {
        Self {
            institution_code: first_string_attr(record, &["InstitutionCode", "Institution"]),
            english_institute_name: first_string_attr(
                record,
                &["EnglishInstituteName", "InstitutionName", "Title", "Institution"],
            ),
            arabic_institute_name: string_attr(record, "ArabicInstituteName"),
            reviews: map_list(record.get("Reviews"), ProgrammeReview::from_item),
            average_judgement: number_attr(record, "AverageJudgement"),
        }
    }

    fn to_item(&self) -> Item {
        let mut record = item([
            ("InstitutionCode", s(&self.institution_code)),
            ("EnglishInstituteName", s(&self.english_institute_name)),
            ("ArabicInstituteName", s(&self.arabic_institute_name)),
            ("AverageJudgement", opt_n(self.average_judgement)),
        ]);
        record.extend(review_items(&self.reviews, ProgrammeReview::to_item));
        record
    }

    fn english_name(&self) -> &str {
        &self.english_institute_name
    }

    fn arabic_name(&self) -> &str {
        &self.arabic_institute_name
    }

    fn reviews(&self) -> &[ProgrammeReview] {
        &self.reviews
    }

    fn comparison(&self) -> ReviewList<ProgrammeReview> {
        ReviewList {
            name: self.english_institute_name.clone(),
            reviews: self.reviews.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;

    fn review(date: &str, grade: &str) -> Review {
        Review {
            cycle: "Cycle 1".into(),
            batch: "Batch 1".into(),
            batch_release_date: date.into(),
            review_type: "Review Report".into(),
            grade: grade.into(),
        }
    }

    #[test]
    fn nested_review_list_parses_into_flat_reviews() {
        let record = item([
            ("InstitutionCode", s("S101")),
            ("EnglishSchoolName", s("Al Noor School")),
            ("ArabicSchoolName", s("مدرسة النور")),
            ("SchoolType", s("Private")),
            ("AverageGrade", AttributeValue::N("2.5".into())),
            (
                "Reviews",
                AttributeValue::L(vec![
                    AttributeValue::M(item([
                        ("Cycle", s("Cycle 2")),
                        ("Batch", s("Batch 4")),
                        ("BatchReleaseDate", s("Mar-13")),
                        ("ReviewType", s("Review Report")),
                        ("Grade", s("(2) Good")),
                    ])),
                    AttributeValue::M(item([("Cycle", s("Cycle 3"))])),
                ]),
            ),
        ]);

        let school = School::from_item(&record);
        assert_eq!(school.english_school_name, "Al Noor School");
        assert_eq!(school.average_grade, Some(2.5));
        assert_eq!(school.reviews.len(), 2);
        assert_eq!(
            school.reviews[0],
            Review {
                cycle: "Cycle 2".into(),
                batch: "Batch 4".into(),
                batch_release_date: "Mar-13".into(),
                review_type: "Review Report".into(),
                grade: "(2) Good".into(),
            }
        );
        assert_eq!(school.reviews[1].cycle, "Cycle 3");
        assert_eq!(school.reviews[1].batch, "");
        assert_eq!(school.reviews[1].grade, "");
    }

    #[test]
    fn school_item_survives_a_write_and_read() {
        let school = School {
            institution_code: "S1".into(),
            english_school_name: "Jidhafs Secondary Girls School".into(),
            arabic_school_name: "مدرسة جدحفص الثانوية للبنات".into(),
            school_type: "Government".into(),
            reviews: vec![review("Jun-09", "(3) Satisfactory")],
            average_grade: Some(3.0),
            school_level: Some("Secondary".into()),
            school_gender: Some("Girls".into()),
        };
        assert_eq!(School::from_item(&school.to_item()), school);
    }

    #[test]
    fn missing_average_is_null_in_the_item() {
        let institute = VocationalInstitute {
            institution_code: "V1".into(),
            ..Default::default()
        };
        let record = institute.to_item();
        assert_eq!(record.get("AverageGrade"), Some(&AttributeValue::Null(true)));
        assert_eq!(VocationalInstitute::from_item(&record).average_grade, None);
    }

    #[test]
    fn name_matching_ignores_english_case_only() {
        let school = School {
            english_school_name: "Al Noor School".into(),
            arabic_school_name: "مدرسة النور".into(),
            ..Default::default()
        };
        assert!(school.matches_name("AL NOOR SCHOOL"));
        assert!(school.matches_name("al noor school"));
        assert!(school.matches_name("مدرسة النور"));
        assert!(!school.matches_name("Al Noor"));
        assert!(!school.matches_name(""));
    }

    #[test]
    fn latest_review_uses_parsed_release_dates() {
        let reviews = vec![review("July 2024", "(1) Outstanding"), review("Mar-13", "(3) Satisfactory")];
        assert_eq!(latest_review(&reviews).unwrap().batch_release_date, "July 2024");

        let reversed = vec![review("Mar-13", "(3) Satisfactory"), review("July 2024", "(1) Outstanding")];
        assert_eq!(latest_review(&reversed).unwrap().batch_release_date, "July 2024");
    }

    #[test]
    fn undated_reviews_rank_below_dated_ones() {
        let reviews = vec![review("sometime", "(4) Inadequate"), review("Jun-09", "(2) Good")];
        assert_eq!(latest_review(&reviews).unwrap().batch_release_date, "Jun-09");
        assert!(latest_review(&[]).is_none());
    }

    #[test]
    fn grade_numbers_come_from_the_label_prefix() {
        assert_eq!(grade_number("(2) Good"), Some(2));
        assert_eq!(grade_number(" (4) Inadequate"), Some(4));
        assert_eq!(grade_number("Good"), None);
        assert_eq!(grade_number(""), None);
    }

    #[test]
    fn university_reads_legacy_name_attributes() {
        let record = item([
            ("InstitutionCode", s("U1")),
            ("Title", s("Bahrain Polytechnic")),
            (
                "Reviews",
                AttributeValue::L(vec![AttributeValue::M(item([
                    ("Program", s("Information Technology")),
                    ("Type", s("Programme Review")),
                    ("Judgement", s("(1) Confidence")),
                ]))]),
            ),
        ]);
        let university = University::from_item(&record);
        assert_eq!(university.english_institute_name, "Bahrain Polytechnic");
        assert_eq!(university.reviews[0].program, "Information Technology");
        assert_eq!(university.reviews[0].report_file, "");
    }
}
