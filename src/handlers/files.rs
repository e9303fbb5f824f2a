//! File metadata lifecycle: storage events keep the table in step with the bucket, and the
//! file management page lists and deletes through the API.

use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::Error;
use serde::Deserialize;
use tracing::info;

use crate::api::{self, ApiResponse};
use crate::clients::{KeyValueTable, ObjectStore};
use crate::config::FileConfig;
use crate::dynamo::{item, s};
use crate::error::{AppError, AppResult};
use crate::handlers::{required_field, respond};
use crate::model::file::file_name_from_key;
use crate::model::{FileListing, ObjectRef};

const SIDECAR_SUFFIX: &str = ".metadata.json";

/// Object-created notifications.
pub async fn record_file_handler(table: &dyn KeyValueTable, event: S3Event) -> Result<(), Error> {
    let config = FileConfig::table_only_from_env()?;
    let recorded = record_created(&config, table, &ObjectRef::from_s3(&event)).await?;
    info!(recorded, "recorded uploaded files");
    Ok(())
}

/// Object-removed notifications.
pub async fn forget_file_handler(table: &dyn KeyValueTable, event: S3Event) -> Result<(), Error> {
    let config = FileConfig::table_only_from_env()?;
    forget_removed(&config, table, &ObjectRef::from_s3(&event)).await?;
    Ok(())
}

pub async fn list_files_handler(
    table: &dyn KeyValueTable,
    _request: ApiGatewayV2httpRequest,
) -> Result<ApiGatewayV2httpResponse, Error> {
    Ok(respond(handle_list(table).await))
}

async fn handle_list(table: &dyn KeyValueTable) -> AppResult<ApiGatewayV2httpResponse> {
    let config = FileConfig::table_only_from_env()?;
    let files = list_files(&config, table).await?;
    Ok(api::ok(files))
}

pub async fn delete_file_handler(
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    request: ApiGatewayV2httpRequest,
) -> Result<ApiGatewayV2httpResponse, Error> {
    Ok(respond(handle_delete(store, table, &request).await))
}

async fn handle_delete(
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    request: &ApiGatewayV2httpRequest,
) -> AppResult<ApiGatewayV2httpResponse> {
    let config = FileConfig::from_env()?;
    let body: DeleteRequest = api::parse_body(request)?;
    let file_key =
        required_field(body.file_key).ok_or_else(|| AppError::invalid("fileKey is required"))?;
    delete_file(&config, store, table, &file_key).await?;
    Ok(api::json_response(
        200,
        &ApiResponse::message("File deleted successfully"),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub file_key: Option<String>,
}

/// Writes `{fileKey, fileName}` for objects that have no record yet. Returns how many
/// records were created.
pub async fn record_created(
    config: &FileConfig,
    table: &dyn KeyValueTable,
    objects: &[ObjectRef],
) -> AppResult<usize> {
    let mut created = 0;
    for object in objects {
        if object.key.ends_with('/') || object.key.ends_with(SIDECAR_SUFFIX) {
            continue;
        }
        let record = item([
            ("fileKey", s(&object.key)),
            ("fileName", s(file_name_from_key(&object.key))),
        ]);
        if table
            .put_item_if_absent(&config.metadata_table, "fileKey", record)
            .await?
        {
            created += 1;
        } else {
            info!(file_key = %object.key, "metadata already recorded");
        }
    }
    Ok(created)
}

pub async fn forget_removed(
    config: &FileConfig,
    table: &dyn KeyValueTable,
    objects: &[ObjectRef],
) -> AppResult<()> {
    for object in objects {
        table
            .delete_item(&config.metadata_table, item([("fileKey", s(&object.key))]))
            .await?;
        info!(file_key = %object.key, "removed file metadata");
    }
    Ok(())
}

pub async fn list_files(config: &FileConfig, table: &dyn KeyValueTable) -> AppResult<Vec<FileListing>> {
    let records = table.scan(&config.metadata_table).await?;
    Ok(records.iter().map(FileListing::from_item).collect())
}

/// Chunks produced from a report live under `SplitFiles/{name}/`.
pub fn split_prefix(file_key: &str) -> String {
    let name = file_key.strip_prefix("Files/").unwrap_or(file_key);
    format!("SplitFiles/{name}/")
}

pub async fn delete_file(
    config: &FileConfig,
    store: &dyn ObjectStore,
    table: &dyn KeyValueTable,
    file_key: &str,
) -> AppResult<()> {
    store.delete_object(&config.bucket, file_key).await?;

    let chunks = store.list_keys(&config.bucket, &split_prefix(file_key)).await?;
    if !chunks.is_empty() {
        store.delete_objects(&config.bucket, &chunks).await?;
    }

    table
        .delete_item(&config.metadata_table, item([("fileKey", s(file_key))]))
        .await?;
    info!(%file_key, chunks = chunks.len(), "deleted file");
    Ok(())
}
