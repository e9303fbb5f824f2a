use async_trait::async_trait;
use aws_sdk_dynamodb::types::{PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use tracing::warn;

use super::KeyValueTable;
use crate::dynamo::Item;
use crate::error::{AppError, AppResult};

/// `BatchWriteItem` accepts at most 25 requests.
pub const BATCH_WRITE_LIMIT: usize = 25;
const UNPROCESSED_RETRIES: usize = 3;

#[derive(Clone, Debug)]
pub struct DynamoTable {
    client: Client,
}

impl DynamoTable {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyValueTable for DynamoTable {
    async fn put_item(&self, table: &str, item: Item) -> AppResult<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| AppError::service("dynamodb.put_item", e))?;
        Ok(())
    }

    async fn put_item_if_absent(
        &self,
        table: &str,
        key_attr: &str,
        item: Item,
    ) -> AppResult<bool> {
        let result = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#key)")
            .expression_attribute_names("#key", key_attr)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Ok(false)
            }
            Err(err) => Err(AppError::service("dynamodb.put_item", err)),
        }
    }

    async fn delete_item(&self, table: &str, key: Item) -> AppResult<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| AppError::service("dynamodb.delete_item", e))?;
        Ok(())
    }

    async fn scan(&self, table: &str) -> AppResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| AppError::service("dynamodb.scan", e))?;

            items.extend(output.items.unwrap_or_default());

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn batch_put(&self, table: &str, items: Vec<Item>) -> AppResult<()> {
        for chunk in items.chunks(BATCH_WRITE_LIMIT) {
            let mut requests = chunk
                .iter()
                .map(|item| {
                    PutRequest::builder()
                        .set_item(Some(item.clone()))
                        .build()
                        .map(|put| WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::service("dynamodb.batch_write_item", e))?;

            for attempt in 0..=UNPROCESSED_RETRIES {
                let output = self
                    .client
                    .batch_write_item()
                    .request_items(table, requests)
                    .send()
                    .await
                    .map_err(|e| AppError::service("dynamodb.batch_write_item", e))?;

                requests = output
                    .unprocessed_items
                    .and_then(|mut unprocessed| unprocessed.remove(table))
                    .unwrap_or_default();
                if requests.is_empty() {
                    break;
                }
                if attempt == UNPROCESSED_RETRIES {
                    return Err(AppError::Service {
                        operation: "dynamodb.batch_write_item",
                        message: format!("{} items left unprocessed", requests.len()),
                    });
                }
                warn!(table, remaining = requests.len(), "retrying unprocessed batch items");
            }
        }
        Ok(())
    }
}
