//! In-memory stand-ins for the service traits, used by handler tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::clients::{
    BotTarget, ChatBot, DetectedEntity, FunctionInvoker, KeyValueTable, MessageQueue, NewUser,
    ObjectStore, OcrService, TextAnalyzer, TextModel, UserDirectory,
};
use crate::dynamo::Item;
use crate::error::{AppError, AppResult};
use crate::ocr::{OcrBlock, OcrJobKind, OcrPage, OcrStatus};

fn unavailable(operation: &'static str) -> AppError {
    AppError::Service {
        operation,
        message: "service unavailable".into(),
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub objects: Mutex<BTreeMap<(String, String), (Vec<u8>, String)>>,
    pub presigned: Mutex<Vec<(String, String, String, Duration)>>,
}

impl FakeStore {
    pub fn with_object(self, bucket: &str, key: &str, body: &[u8]) -> Self {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (body.to_vec(), "application/octet-stream".into()),
        );
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> AppResult<String> {
        self.presigned.lock().unwrap().push((
            bucket.to_string(),
            key.to_string(),
            content_type.to_string(),
            expires_in,
        ));
        Ok(format!(
            "https://{bucket}.s3.amazonaws.com/{key}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> AppResult<Vec<u8>> {
        self.object(bucket, key)
            .map(|(body, _)| body)
            .ok_or_else(|| AppError::NotFound(format!("{bucket}/{key}")))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> AppResult<()> {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (body, content_type.to_string()),
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> AppResult<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> AppResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> AppResult<()> {
        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(&(bucket.to_string(), key.clone()));
        }
        Ok(())
    }
}

/// Tables keyed by name; items are matched on the attributes passed as keys.
#[derive(Default)]
pub struct FakeTable {
    pub tables: Mutex<HashMap<String, Vec<Item>>>,
    pub batch_sizes: Mutex<Vec<usize>>,
    pub fail_writes: bool,
}

impl FakeTable {
    pub fn with_items(self, table: &str, items: Vec<Item>) -> Self {
        self.tables.lock().unwrap().insert(table.to_string(), items);
        self
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn items(&self, table: &str) -> Vec<Item> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

fn matches_key(item: &Item, key: &Item) -> bool {
    key.iter().all(|(name, value)| item.get(name) == Some(value))
}

#[async_trait]
impl KeyValueTable for FakeTable {
    async fn put_item(&self, table: &str, item: Item) -> AppResult<()> {
        if self.fail_writes {
            return Err(unavailable("dynamodb.put_item"));
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(item);
        Ok(())
    }

    async fn put_item_if_absent(
        &self,
        table: &str,
        key_attr: &str,
        item: Item,
    ) -> AppResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let key = item.get(key_attr).cloned().unwrap_or(AttributeValue::Null(true));
        if rows.iter().any(|row| row.get(key_attr) == Some(&key)) {
            return Ok(false);
        }
        rows.push(item);
        Ok(true)
    }

    async fn delete_item(&self, table: &str, key: Item) -> AppResult<()> {
        if let Some(rows) = self.tables.lock().unwrap().get_mut(table) {
            rows.retain(|row| !matches_key(row, &key));
        }
        Ok(())
    }

    async fn scan(&self, table: &str) -> AppResult<Vec<Item>> {
        Ok(self.items(table))
    }

    async fn batch_put(&self, table: &str, items: Vec<Item>) -> AppResult<()> {
        if self.fail_writes {
            return Err(unavailable("dynamodb.batch_write_item"));
        }
        let mut sizes = self.batch_sizes.lock().unwrap();
        for chunk in items.chunks(crate::clients::dynamodb::BATCH_WRITE_LIMIT) {
            sizes.push(chunk.len());
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(items);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeQueue {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl FakeQueue {
    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| serde_json::from_str(body).unwrap())
            .collect()
    }
}

#[async_trait]
impl MessageQueue for FakeQueue {
    async fn send(&self, queue_url: &str, body: String) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((queue_url.to_string(), body));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeInvoker {
    pub calls: Mutex<Vec<(String, serde_json::Value)>>,
    pub fail: bool,
}

#[async_trait]
impl FunctionInvoker for FakeInvoker {
    async fn invoke_async(&self, function_name: &str, payload: Vec<u8>) -> AppResult<()> {
        if self.fail {
            return Err(unavailable("lambda.invoke"));
        }
        let payload = serde_json::from_slice(&payload)?;
        self.calls
            .lock()
            .unwrap()
            .push((function_name.to_string(), payload));
        Ok(())
    }
}

/// OCR jobs that report `InProgress` a set number of times, then succeed or fail.
pub struct FakeOcr {
    lines: Vec<OcrBlock>,
    tables: Vec<OcrBlock>,
    extra_page: Option<Vec<OcrBlock>>,
    failure: Option<String>,
    pending: Mutex<HashMap<OcrJobKind, u32>>,
    pub started: Mutex<Vec<(OcrJobKind, String, String)>>,
}

impl FakeOcr {
    pub fn succeeding(lines: Vec<OcrBlock>, tables: Vec<OcrBlock>) -> Self {
        Self {
            lines,
            tables,
            extra_page: None,
            failure: None,
            pending: Mutex::new(HashMap::new()),
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::succeeding(Vec::new(), Vec::new())
        }
    }

    pub fn with_pending_polls(self, polls: u32) -> Self {
        {
            let mut pending = self.pending.lock().unwrap();
            pending.insert(OcrJobKind::TextDetection, polls);
            pending.insert(OcrJobKind::TableAnalysis, polls);
        }
        self
    }

    /// A second result page for the text detection job.
    pub fn with_extra_page(mut self, blocks: Vec<OcrBlock>) -> Self {
        self.extra_page = Some(blocks);
        self
    }
}

#[async_trait]
impl OcrService for FakeOcr {
    async fn start_job(&self, kind: OcrJobKind, bucket: &str, key: &str) -> AppResult<String> {
        self.started
            .lock()
            .unwrap()
            .push((kind, bucket.to_string(), key.to_string()));
        Ok(match kind {
            OcrJobKind::TextDetection => "job-text".to_string(),
            OcrJobKind::TableAnalysis => "job-tables".to_string(),
        })
    }

    async fn job_page(
        &self,
        kind: OcrJobKind,
        _job_id: &str,
        next_token: Option<String>,
    ) -> AppResult<OcrPage> {
        if let Some(reason) = &self.failure {
            return Ok(OcrPage {
                status: OcrStatus::Failed,
                status_message: Some(reason.clone()),
                blocks: Vec::new(),
                next_token: None,
            });
        }

        {
            let mut pending = self.pending.lock().unwrap();
            let remaining = pending.entry(kind).or_insert(0);
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(OcrPage {
                    status: OcrStatus::InProgress,
                    status_message: None,
                    blocks: Vec::new(),
                    next_token: None,
                });
            }
        }

        let (blocks, next_token) = match (kind, next_token, &self.extra_page) {
            (OcrJobKind::TextDetection, Some(_), Some(extra)) => (extra.clone(), None),
            (OcrJobKind::TextDetection, None, Some(_)) => {
                (self.lines.clone(), Some("page-2".to_string()))
            }
            (OcrJobKind::TextDetection, _, _) => (self.lines.clone(), None),
            (OcrJobKind::TableAnalysis, _, _) => (self.tables.clone(), None),
        };
        Ok(OcrPage {
            status: OcrStatus::Succeeded,
            status_message: None,
            blocks,
            next_token,
        })
    }
}

pub struct FakeModel {
    reply: Option<String>,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextModel for FakeModel {
    async fn complete(&self, model_id: &str, prompt: &str) -> AppResult<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((model_id.to_string(), prompt.to_string()));
        self.reply
            .clone()
            .ok_or_else(|| unavailable("bedrock.converse"))
    }
}

#[derive(Default)]
pub struct FakeAnalyzer {
    pub phrases: Vec<String>,
    pub entities: Vec<DetectedEntity>,
}

#[async_trait]
impl TextAnalyzer for FakeAnalyzer {
    async fn key_phrases(&self, _text: &str) -> AppResult<Vec<String>> {
        Ok(self.phrases.clone())
    }

    async fn entities(&self, _text: &str) -> AppResult<Vec<DetectedEntity>> {
        Ok(self.entities.clone())
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    pub existing: Vec<String>,
    pub created: Mutex<Vec<(String, NewUser)>>,
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn email_exists(&self, _user_pool_id: &str, email: &str) -> AppResult<bool> {
        Ok(self.existing.iter().any(|e| e == email))
    }

    async fn create_user(&self, user_pool_id: &str, user: &NewUser) -> AppResult<()> {
        self.created
            .lock()
            .unwrap()
            .push((user_pool_id.to_string(), user.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBot {
    pub replies: Vec<String>,
    /// `(bot_id, bot_alias_id, session_id, text)` per call.
    pub calls: Mutex<Vec<(String, String, String, String)>>,
}

#[async_trait]
impl ChatBot for FakeBot {
    async fn recognize_text(
        &self,
        bot: BotTarget<'_>,
        session_id: &str,
        text: &str,
    ) -> AppResult<Vec<String>> {
        self.calls.lock().unwrap().push((
            bot.bot_id.to_string(),
            bot.bot_alias_id.to_string(),
            session_id.to_string(),
            text.to_string(),
        ));
        Ok(self.replies.clone())
    }
}
