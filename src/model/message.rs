use serde::{Deserialize, Serialize};

/// Queued once per uploaded PDF; consumed by the text extraction worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMessage {
    pub bucket_name: String,
    pub file_key: String,
    pub unique_id: String,
}

/// Extracted report text, routed by category to a metadata extractor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub file_key: String,
}

/// One record of an SQS batch, detached from the event type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueRecord {
    pub message_id: String,
    pub body: String,
}

impl QueueRecord {
    pub fn from_sqs(event: &aws_lambda_events::event::sqs::SqsEvent) -> Vec<QueueRecord> {
        event
            .records
            .iter()
            .map(|record| QueueRecord {
                message_id: record.message_id.clone().unwrap_or_default(),
                body: record.body.clone().unwrap_or_default(),
            })
            .collect()
    }
}

/// Partial batch response; listed records are returned to the queue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub batch_item_failures: Vec<BatchItemFailure>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub item_identifier: String,
}

impl BatchResponse {
    pub fn fail(&mut self, message_id: &str) {
        self.batch_item_failures.push(BatchItemFailure {
            item_identifier: message_id.to_string(),
        });
    }
}

/// An object named by an S3 notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    /// Records without a bucket or key are dropped; keys are URL-decoded.
    pub fn from_s3(event: &aws_lambda_events::event::s3::S3Event) -> Vec<ObjectRef> {
        event
            .records
            .iter()
            .filter_map(|record| {
                let bucket = record.s3.bucket.name.clone()?;
                let key = record.s3.object.key.as_deref()?;
                Some(ObjectRef {
                    bucket,
                    key: decode_object_key(key),
                })
            })
            .collect()
    }
}

/// S3 notifications encode spaces as `+` and the rest as percent escapes.
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_encoding::percent_decode_str(&spaced)
        .decode_utf8_lossy()
        .into_owned()
}
