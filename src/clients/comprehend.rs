use async_trait::async_trait;
use aws_sdk_comprehend::types::LanguageCode;
use aws_sdk_comprehend::Client;

use super::{DetectedEntity, TextAnalyzer};
use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct ComprehendAnalyzer {
    client: Client,
}

impl ComprehendAnalyzer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextAnalyzer for ComprehendAnalyzer {
    async fn key_phrases(&self, text: &str) -> AppResult<Vec<String>> {
        let output = self
            .client
            .detect_key_phrases()
            .text(text)
            .language_code(LanguageCode::En)
            .send()
            .await
            .map_err(|e| AppError::service("comprehend.detect_key_phrases", e))?;

        Ok(output
            .key_phrases()
            .iter()
            .map(|phrase| phrase.text().unwrap_or_default().to_string())
            .collect())
    }

    async fn entities(&self, text: &str) -> AppResult<Vec<DetectedEntity>> {
        let output = self
            .client
            .detect_entities()
            .text(text)
            .language_code(LanguageCode::En)
            .send()
            .await
            .map_err(|e| AppError::service("comprehend.detect_entities", e))?;

        Ok(output
            .entities()
            .iter()
            .map(|entity| DetectedEntity {
                kind: entity
                    .r#type()
                    .map(|kind| kind.as_str().to_string())
                    .unwrap_or_default(),
                text: entity.text().unwrap_or_default().to_string(),
            })
            .collect())
    }
}
