//! Read-side queries over a scanned institution table.
//!
//! Tables are small enough to scan whole; every query works on the parsed records and
//! recomputes review ordering on each call.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::dates::year_month;
use crate::dynamo::Item;
use crate::model::{latest_review, Institute, ReviewList, ReviewRecord, School};

/// Parses scanned items on the rayon pool.
pub fn parse_items<I: Institute>(items: &[Item]) -> Vec<I> {
    items.par_iter().map(I::from_item).collect()
}

/// A query result, or a `{message}` explaining that nothing matched.
#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryReply<T> {
    Found(T),
    NotFound { message: String },
}

pub fn get_single<I: Institute>(institutes: &[I], name: &str) -> QueryReply<ReviewList<I::Review>> {
    match institutes.iter().find(|i| i.matches_name(name)) {
        Some(institute) => QueryReply::Found(ReviewList {
            name: institute.english_name().to_string(),
            reviews: institute.reviews().to_vec(),
        }),
        None => QueryReply::NotFound {
            message: format!("No {} found with the name {}.", I::KIND.noun(), name.trim()),
        },
    }
}

/// Institutes matching any of `names`, in table order.
pub fn compare_specific<I: Institute>(
    institutes: &[I],
    names: &[String],
) -> QueryReply<Vec<I::Comparison>> {
    let matched: Vec<I::Comparison> = institutes
        .iter()
        .filter(|i| names.iter().any(|name| i.matches_name(name)))
        .map(Institute::comparison)
        .collect();

    if matched.is_empty() {
        QueryReply::NotFound {
            message: format!(
                "No matching {} found for the specified names.",
                I::KIND.plural()
            ),
        }
    } else {
        QueryReply::Found(matched)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataPoint {
    pub x: String,
    pub y: Option<f64>,
}

/// One chart series per school.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<DataPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeComparison {
    pub government_schools: Vec<Dataset>,
    pub private_schools: Vec<Dataset>,
}

pub fn compare_types<'a>(schools: impl IntoIterator<Item = &'a School>) -> TypeComparison {
    let schools: Vec<&School> = schools.into_iter().collect();
    let datasets = |school_type: &str| -> Vec<Dataset> {
        schools
            .iter()
            .filter(|s| s.school_type == school_type)
            .map(|school| Dataset {
                label: school.english_school_name.clone(),
                data: latest_review(&school.reviews)
                    .map(|review| DataPoint {
                        x: review.cycle.clone(),
                        y: ReviewRecord::grade(review).map(f64::from),
                    })
                    .into_iter()
                    .collect(),
            })
            .collect()
    };

    TypeComparison {
        government_schools: datasets("Government"),
        private_schools: datasets("Private"),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodGrades {
    /// `YYYY-MM` of the batch release.
    pub period: String,
    pub total: usize,
    /// Share of the period's reviews per grade, in percent.
    pub percentages: BTreeMap<u32, f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeTrends {
    pub distribution: BTreeMap<u32, usize>,
    pub by_period: Vec<PeriodGrades>,
    /// Institutions counted under the best grade they ever received.
    pub best_grades: BTreeMap<u32, usize>,
}

pub fn grade_trends<I: Institute>(institutes: &[I]) -> GradeTrends {
    let mut trends = GradeTrends::default();
    let mut periods: BTreeMap<String, BTreeMap<u32, usize>> = BTreeMap::new();

    for institute in institutes {
        let mut best: Option<u32> = None;
        for review in institute.reviews() {
            let Some(grade) = review.grade() else {
                continue;
            };
            *trends.distribution.entry(grade).or_default() += 1;
            best = Some(best.map_or(grade, |b| b.min(grade)));

            if let Some(date) = review.release_date() {
                *periods
                    .entry(year_month(date))
                    .or_default()
                    .entry(grade)
                    .or_default() += 1;
            }
        }
        if let Some(best) = best {
            *trends.best_grades.entry(best).or_default() += 1;
        }
    }

    trends.by_period = periods
        .into_iter()
        .map(|(period, counts)| {
            let total: usize = counts.values().sum();
            let percentages = counts
                .into_iter()
                .map(|(grade, count)| (grade, round2(count as f64 * 100.0 / total as f64)))
                .collect();
            PeriodGrades {
                period,
                total,
                percentages,
            }
        })
        .collect();

    trends
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
