use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;

use super::ObjectStore;
use crate::error::{AppError, AppResult};

/// `DeleteObjects` accepts at most this many keys per request.
const DELETE_BATCH: usize = 1000;

#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| AppError::service("s3.presign", e))?;
        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::service("s3.presign", e))?;
        Ok(request.uri().to_string())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> AppResult<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::service("s3.get_object", e))?;
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::service("s3.get_object", e))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> AppResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| AppError::service("s3.put_object", e))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::service("s3.delete_object", e))?;
        Ok(())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| AppError::service("s3.list_objects_v2", e))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string())
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> AppResult<()> {
        for chunk in keys.chunks(DELETE_BATCH) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::service("s3.delete_objects", e))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| AppError::service("s3.delete_objects", e))?;

            self.client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| AppError::service("s3.delete_objects", e))?;
        }
        Ok(())
    }
}
