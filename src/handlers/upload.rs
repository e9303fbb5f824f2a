//! Issues presigned upload URLs, records file metadata and queues PDFs for text extraction.

use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use chrono::Utc;
use futures::future::try_join_all;
use lambda_runtime::Error;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::{self, ApiResponse};
use crate::clients::{KeyValueTable, MessageQueue, ObjectStore};
use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::{required_field, respond};
use crate::model::{FileMetadata, ProcessingMessage};

const UPLOAD_PREFIX: &str = "Files/";

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub files: Vec<FileRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: u64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrl {
    pub file_name: String,
    pub file_key: String,
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
}

#[derive(Debug, Serialize)]
pub struct UploadUrls {
    #[serde(rename = "uploadURLs")]
    pub upload_urls: Vec<UploadUrl>,
}

pub fn is_pdf(file_name: &str, file_type: &str) -> bool {
    file_type.eq_ignore_ascii_case("application/pdf")
        || file_name.to_ascii_lowercase().ends_with(".pdf")
}

pub async fn function_handler(
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    queue: &dyn MessageQueue,
    request: ApiGatewayV2httpRequest,
) -> Result<ApiGatewayV2httpResponse, Error> {
    Ok(respond(handle(store, table, queue, &request).await))
}

async fn handle(
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    queue: &dyn MessageQueue,
    request: &ApiGatewayV2httpRequest,
) -> AppResult<ApiGatewayV2httpResponse> {
    let config = UploadConfig::from_env()?;
    let body: UploadRequest = api::parse_body(request)?;
    let urls = issue_upload_urls(&config, store, table, queue, body).await?;
    Ok(api::json_response(
        200,
        &ApiResponse::success(UploadUrls { upload_urls: urls })
            .with_message("Upload URLs generated successfully"),
    ))
}

pub async fn issue_upload_urls(
    config: &UploadConfig,
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    queue: &dyn MessageQueue,
    request: UploadRequest,
) -> AppResult<Vec<UploadUrl>> {
    if request.files.is_empty() {
        return Err(AppError::invalid("No files provided"));
    }

    let files = request
        .files
        .into_iter()
        .map(|file| {
            match (required_field(file.file_name), required_field(file.file_type)) {
                (Some(name), Some(file_type)) => Ok((name, file_type, file.file_size)),
                _ => Err(AppError::invalid(
                    "fileName and fileType are required for every file",
                )),
            }
        })
        .collect::<AppResult<Vec<_>>>()?;

    try_join_all(files.into_iter().map(|(name, file_type, size)| {
        prepare_upload(config, store, table, queue, name, file_type, size)
    }))
    .await
}

async fn prepare_upload(
    config: &UploadConfig,
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    queue: &dyn MessageQueue,
    file_name: String,
    file_type: String,
    file_size: u64,
) -> AppResult<UploadUrl> {
    let file_key = format!("{UPLOAD_PREFIX}{file_name}");
    let upload_url = store
        .presign_put(&config.bucket, &file_key, &file_type, config.url_ttl)
        .await?;

    let metadata = FileMetadata {
        file_key: file_key.clone(),
        file_name: file_name.clone(),
        file_url: format!("https://{}.s3.amazonaws.com/{}", config.bucket, file_key),
        file_size,
        file_type: file_type.clone(),
        uploaded_at: Utc::now(),
    };
    table
        .put_item(&config.metadata_table, metadata.to_item())
        .await?;

    if is_pdf(&file_name, &file_type) {
        let message = ProcessingMessage {
            bucket_name: config.bucket.clone(),
            file_key: file_key.clone(),
            unique_id: Uuid::new_v4().to_string(),
        };
        queue
            .send(&config.processing_queue_url, serde_json::to_string(&message)?)
            .await?;
        info!(%file_key, unique_id = %message.unique_id, "queued report for text extraction");
    }

    Ok(UploadUrl {
        file_name,
        file_key,
        upload_url,
    })
}
