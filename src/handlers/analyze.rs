//! Key phrases and named entities for a block of report text.

use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use lambda_runtime::Error;
use serde::{Deserialize, Serialize};

use crate::api::{self, ApiResponse};
use crate::clients::{DetectedEntity, TextAnalyzer};
use crate::error::{AppError, AppResult};
use crate::handlers::{required_field, respond};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct EntityGroups {
    pub locations: Vec<String>,
    pub organizations: Vec<String>,
    pub dates: Vec<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnalysis {
    pub key_phrases: String,
    pub entities: EntityGroups,
}

pub async fn function_handler(
    analyzer: &dyn TextAnalyzer,
    request: ApiGatewayV2httpRequest,
) -> Result<ApiGatewayV2httpResponse, Error> {
    Ok(respond(handle(analyzer, &request).await))
}

async fn handle(
    analyzer: &dyn TextAnalyzer,
    request: &ApiGatewayV2httpRequest,
) -> AppResult<ApiGatewayV2httpResponse> {
    let body: AnalyzeRequest = api::parse_body(request)?;
    let text = required_field(body.text).ok_or_else(|| AppError::invalid("Text not provided"))?;
    let analysis = analyze(analyzer, &text).await?;
    Ok(api::json_response(
        200,
        &ApiResponse::success(analysis).with_message("Text summarized successfully"),
    ))
}

pub async fn analyze(analyzer: &dyn TextAnalyzer, text: &str) -> AppResult<TextAnalysis> {
    let (phrases, entities) = tokio::try_join!(analyzer.key_phrases(text), analyzer.entities(text))?;
    Ok(TextAnalysis {
        key_phrases: summarize_phrases(&phrases),
        entities: group_entities(entities),
    })
}

/// Joins phrases into one sentence, e.g. `"a, b."`.
pub fn summarize_phrases(phrases: &[String]) -> String {
    if phrases.is_empty() {
        return String::new();
    }
    format!("{}.", phrases.join(", "))
}

pub fn group_entities(entities: Vec<DetectedEntity>) -> EntityGroups {
    let mut groups = EntityGroups::default();
    for entity in entities {
        let bucket = match entity.kind.as_str() {
            "LOCATION" => &mut groups.locations,
            "ORGANIZATION" => &mut groups.organizations,
            "DATE" => &mut groups.dates,
            _ => continue,
        };
        if !bucket.contains(&entity.text) {
            bucket.push(entity.text);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::body_json;
    use crate::testing::FakeAnalyzer;

    fn entity(kind: &str, text: &str) -> DetectedEntity {
        DetectedEntity {
            kind: kind.into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn phrases_and_entities_are_combined() {
        let analyzer = FakeAnalyzer {
            phrases: vec!["the school".into(), "overall effectiveness".into()],
            entities: vec![
                entity("LOCATION", "Manama"),
                entity("ORGANIZATION", "BQA"),
                entity("DATE", "May 2018"),
                entity("PERSON", "Ali"),
                entity("LOCATION", "Manama"),
            ],
        };

        let analysis = analyze(&analyzer, "report text").await.unwrap();

        assert_eq!(analysis.key_phrases, "the school, overall effectiveness.");
        assert_eq!(
            analysis.entities,
            EntityGroups {
                locations: vec!["Manama".into()],
                organizations: vec!["BQA".into()],
                dates: vec!["May 2018".into()],
            }
        );
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let request = ApiGatewayV2httpRequest {
            body: Some(r#"{"text": "   "}"#.into()),
            ..Default::default()
        };
        let response = function_handler(&FakeAnalyzer::default(), request)
            .await
            .unwrap();

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response)["error"], "Text not provided");
    }
}
