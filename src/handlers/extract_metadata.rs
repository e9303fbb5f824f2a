//! Category extractors: prompt the model for report metadata and store what it returns.

use std::collections::BTreeMap;

use lambda_runtime::Error;
use serde::Serialize;
use tracing::info;

use crate::classify::ReportCategory;
use crate::clients::{KeyValueTable, ObjectStore, TextModel};
use crate::config::ExtractorConfig;
use crate::dynamo::{s, Item};
use crate::error::{AppError, AppResult};
use crate::model::ExtractionMessage;
use crate::prompts::{parse_model_json, template_for};

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMetadata {
    pub file_key: String,
    pub category: ReportCategory,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Sidecar<'a> {
    metadata_attributes: &'a BTreeMap<String, String>,
}

/// Invoked asynchronously by the dispatcher; an error hands the event back to Lambda for retry.
pub async fn function_handler(
    category: ReportCategory,
    model: &dyn TextModel,
    table: &dyn KeyValueTable,
    store: &dyn ObjectStore,
    message: ExtractionMessage,
) -> Result<ExtractedMetadata, Error> {
    let config = ExtractorConfig::from_env(category)?;
    Ok(extract(category, &config, model, table, store, message).await?)
}

pub async fn extract(
    category: ReportCategory,
    config: &ExtractorConfig,
    model: &dyn TextModel,
    table: &dyn KeyValueTable,
    store: &dyn ObjectStore,
    message: ExtractionMessage,
) -> AppResult<ExtractedMetadata> {
    if message.text.trim().is_empty() || message.file_key.trim().is_empty() {
        return Err(AppError::invalid("text and fileKey are required"));
    }

    let template = template_for(category)?;
    let raw = model
        .complete(&config.model_id, &template.render(&message.text))
        .await?;
    let attributes = template.attributes(&parse_model_json(&raw)?);

    let mut record: Item = attributes.iter().map(|(k, v)| (k.clone(), s(v))).collect();
    record.insert("fileKey".into(), s(&message.file_key));
    table.put_item(&config.metadata_table, record).await?;

    if let Some(bucket) = &config.bucket {
        let sidecar = serde_json::to_vec(&Sidecar {
            metadata_attributes: &attributes,
        })?;
        store
            .put_object(
                bucket,
                &format!("{}.metadata.json", message.file_key),
                sidecar,
                "application/json",
            )
            .await?;
    }

    info!(file_key = %message.file_key, category = ?category, fields = attributes.len(), "stored report metadata");
    Ok(ExtractedMetadata {
        file_key: message.file_key,
        category,
        attributes,
    })
}
