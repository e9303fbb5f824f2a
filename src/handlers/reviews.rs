//! Review queries for the chatbot and dashboard, one function per institution table.

use lambda_runtime::Error;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::api::{ApiResponse, DirectResponse};
use crate::clients::KeyValueTable;
use crate::config::ReviewTableConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::log_failure;
use crate::model::{Institute, InstituteKind};
use crate::query::{compare_specific, compare_types, get_single, grade_trends, parse_items};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "query", rename_all = "camelCase")]
pub enum ReviewQuery {
    Single { name: String },
    CompareSpecific { names: Vec<String> },
    CompareTypes,
    GradeTrends,
    All,
}

fn table_config(kind: InstituteKind) -> AppResult<ReviewTableConfig> {
    match kind {
        InstituteKind::School => ReviewTableConfig::schools(),
        InstituteKind::University => ReviewTableConfig::universities(),
        InstituteKind::Vocational => ReviewTableConfig::vocational(),
    }
}

pub async fn function_handler<I: Institute>(
    table: &dyn KeyValueTable,
    payload: Value,
) -> Result<DirectResponse, Error> {
    let result = match table_config(I::KIND) {
        Ok(config) => run_query::<I>(table, &config.table, payload).await,
        Err(err) => Err(err),
    };
    Ok(result.map(DirectResponse::ok).unwrap_or_else(|err| {
        log_failure(&err);
        DirectResponse::failure(&err)
    }))
}

pub async fn run_query<I: Institute>(
    table: &dyn KeyValueTable,
    table_name: &str,
    payload: Value,
) -> AppResult<ApiResponse<Value>> {
    let query: ReviewQuery = serde_json::from_value(payload)
        .map_err(|e| AppError::invalid(format!("Invalid query: {e}")))?;
    validate(&query)?;

    let items = table.scan(table_name).await?;
    let institutes: Vec<I> = parse_items(&items);
    info!(kind = ?I::KIND, records = institutes.len(), query = ?query, "answering review query");

    Ok(ApiResponse::success(answer(&institutes, &query)?))
}

fn validate(query: &ReviewQuery) -> AppResult<()> {
    match query {
        ReviewQuery::Single { name } if name.trim().is_empty() => {
            Err(AppError::invalid("name is required"))
        }
        ReviewQuery::CompareSpecific { names } if names.iter().all(|n| n.trim().is_empty()) => {
            Err(AppError::invalid("names must contain at least one name"))
        }
        _ => Ok(()),
    }
}

pub fn answer<I: Institute>(institutes: &[I], query: &ReviewQuery) -> AppResult<Value> {
    let value = match query {
        ReviewQuery::Single { name } => serde_json::to_value(get_single(institutes, name))?,
        ReviewQuery::CompareSpecific { names } => {
            serde_json::to_value(compare_specific(institutes, names))?
        }
        ReviewQuery::CompareTypes if I::KIND == InstituteKind::School => serde_json::to_value(
            compare_types(institutes.iter().filter_map(Institute::as_school)),
        )?,
        ReviewQuery::CompareTypes => {
            return Err(AppError::invalid(
                "compareTypes is only available for schools",
            ))
        }
        ReviewQuery::GradeTrends => serde_json::to_value(grade_trends(institutes))?,
        ReviewQuery::All => serde_json::to_value(institutes)?,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Review, School, University};
    use crate::testing::FakeTable;
    use serde_json::json;

    fn school(name: &str, school_type: &str, date: &str, grade: &str) -> School {
        School {
            institution_code: format!("{name}-code"),
            english_school_name: name.into(),
            arabic_school_name: format!("مدرسة {name}"),
            school_type: school_type.into(),
            reviews: vec![Review {
                cycle: "Cycle 3".into(),
                batch: "Batch 1".into(),
                batch_release_date: date.into(),
                review_type: "Review Report".into(),
                grade: grade.into(),
            }],
            average_grade: Some(2.0),
            ..Default::default()
        }
    }

    fn table() -> FakeTable {
        FakeTable::default().with_items(
            "schools",
            vec![
                school("Al Noor School", "Private", "July 2024", "(2) Good").to_item(),
                school("Isa Town Primary Girls", "Government", "Mar-13", "(1) Outstanding").to_item(),
            ],
        )
    }

    #[test]
    fn queries_are_tagged_by_name() {
        let query: ReviewQuery =
            serde_json::from_value(json!({"query": "compareSpecific", "names": ["a", "b"]})).unwrap();
        assert_eq!(
            query,
            ReviewQuery::CompareSpecific {
                names: vec!["a".into(), "b".into()]
            }
        );
        let query: ReviewQuery = serde_json::from_value(json!({"query": "gradeTrends"})).unwrap();
        assert_eq!(query, ReviewQuery::GradeTrends);
    }

    #[tokio::test]
    async fn single_lookup_matches_the_arabic_name() {
        let response = run_query::<School>(
            &table(),
            "schools",
            json!({"query": "single", "name": "مدرسة Al Noor School"}),
        )
        .await
        .unwrap();

        let data = response.data.unwrap();
        assert_eq!(data["name"], "Al Noor School");
        assert_eq!(data["reviews"][0]["Grade"], "(2) Good");
    }

    #[tokio::test]
    async fn type_comparison_splits_government_and_private() {
        let response = run_query::<School>(&table(), "schools", json!({"query": "compareTypes"}))
            .await
            .unwrap();

        let data = response.data.unwrap();
        assert_eq!(data["privateSchools"][0]["label"], "Al Noor School");
        assert_eq!(data["governmentSchools"][0]["data"][0]["y"], 1.0);
    }

    #[tokio::test]
    async fn type_comparison_is_rejected_for_universities() {
        let err = run_query::<University>(
            &FakeTable::default(),
            "universities",
            json!({"query": "compareTypes"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn unknown_queries_and_blank_names_are_client_errors() {
        for payload in [
            json!({"query": "everything"}),
            json!({"query": "single", "name": "  "}),
            json!({"query": "compareSpecific", "names": []}),
        ] {
            let err = run_query::<School>(&table(), "schools", payload)
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), 400);
        }
    }

    #[tokio::test]
    async fn listing_returns_every_record() {
        let response = run_query::<School>(&table(), "schools", json!({"query": "all"}))
            .await
            .unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.as_array().unwrap().len(), 2);
        assert_eq!(data[1]["SchoolType"], "Government");
    }

    #[test]
    fn failures_become_a_direct_error_reply() {
        let reply = DirectResponse::failure(&AppError::invalid("name is required"));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"statusCode": 400, "body": {"success": false, "error": "name is required"}})
        );
    }
}
