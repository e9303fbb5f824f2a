//! Service seams. Each trait has one AWS SDK implementation in the sibling modules;
//! handlers only see the traits.

use std::time::Duration;

use async_trait::async_trait;

use crate::dynamo::Item;
use crate::error::AppResult;
use crate::ocr::{OcrJobKind, OcrPage};

pub mod bedrock;
pub mod cognito;
pub mod comprehend;
pub mod dynamodb;
pub mod lambda;
pub mod lex;
pub mod s3;
pub mod sqs;
pub mod textract;

pub use bedrock::BedrockModel;
pub use cognito::CognitoDirectory;
pub use comprehend::ComprehendAnalyzer;
pub use dynamodb::DynamoTable;
pub use lambda::LambdaInvoker;
pub use lex::LexBot;
pub use s3::S3Store;
pub use sqs::SqsQueue;
pub use textract::TextractOcr;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// URL that lets a client `PUT` the object directly.
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> AppResult<String>;

    async fn get_object(&self, bucket: &str, key: &str) -> AppResult<Vec<u8>>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> AppResult<()>;

    async fn delete_object(&self, bucket: &str, key: &str) -> AppResult<()>;

    async fn list_keys(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>>;

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> AppResult<()>;
}

#[async_trait]
pub trait KeyValueTable: Send + Sync {
    async fn put_item(&self, table: &str, item: Item) -> AppResult<()>;

    /// Returns `false` when an item with the same `key_attr` already exists.
    async fn put_item_if_absent(&self, table: &str, key_attr: &str, item: Item)
        -> AppResult<bool>;

    async fn delete_item(&self, table: &str, key: Item) -> AppResult<()>;

    /// Every item in the table, following pagination.
    async fn scan(&self, table: &str) -> AppResult<Vec<Item>>;

    async fn batch_put(&self, table: &str, items: Vec<Item>) -> AppResult<()>;
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, queue_url: &str, body: String) -> AppResult<()>;
}

#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    /// Fire-and-forget invocation; returns once the event is accepted.
    async fn invoke_async(&self, function_name: &str, payload: Vec<u8>) -> AppResult<()>;
}

#[async_trait]
pub trait OcrService: Send + Sync {
    /// Starts a job on `bucket/key` and returns its id.
    async fn start_job(&self, kind: OcrJobKind, bucket: &str, key: &str) -> AppResult<String>;

    async fn job_page(
        &self,
        kind: OcrJobKind,
        job_id: &str,
        next_token: Option<String>,
    ) -> AppResult<OcrPage>;
}

#[async_trait]
pub trait TextModel: Send + Sync {
    /// Single-turn completion; returns the model's raw text.
    async fn complete(&self, model_id: &str, prompt: &str) -> AppResult<String>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectedEntity {
    /// Entity type as reported by the service, e.g. `LOCATION`.
    pub kind: String,
    pub text: String,
}

#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn key_phrases(&self, text: &str) -> AppResult<Vec<String>>;
    async fn entities(&self, text: &str) -> AppResult<Vec<DetectedEntity>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn email_exists(&self, user_pool_id: &str, email: &str) -> AppResult<bool>;

    /// Creates the user with a verified email and makes the password permanent.
    async fn create_user(&self, user_pool_id: &str, user: &NewUser) -> AppResult<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotTarget<'a> {
    pub bot_id: &'a str,
    pub bot_alias_id: &'a str,
    pub locale_id: &'a str,
}

#[async_trait]
pub trait ChatBot: Send + Sync {
    async fn recognize_text(
        &self,
        bot: BotTarget<'_>,
        session_id: &str,
        text: &str,
    ) -> AppResult<Vec<String>>;
}
