//! Queue worker that turns uploaded PDFs into plain text and forwards it for classification.

use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::Error;
use tracing::{error, info, warn};

use crate::clients::{MessageQueue, OcrService};
use crate::config::ExtractionConfig;
use crate::error::AppResult;
use crate::model::{BatchResponse, ExtractionMessage, ProcessingMessage, QueueRecord};
use crate::ocr;

/// SQS rejects bodies over 256 KiB.
pub const MAX_MESSAGE_BYTES: usize = 256 * 1024;

pub async fn function_handler(
    ocr: &dyn OcrService,
    queue: &dyn MessageQueue,
    event: SqsEvent,
) -> Result<BatchResponse, Error> {
    let config = ExtractionConfig::from_env()?;
    Ok(process_batch(&config, ocr, queue, &QueueRecord::from_sqs(&event)).await)
}

pub async fn process_batch(
    config: &ExtractionConfig,
    ocr: &dyn OcrService,
    queue: &dyn MessageQueue,
    records: &[QueueRecord],
) -> BatchResponse {
    let mut response = BatchResponse::default();
    for record in records {
        let message: ProcessingMessage = match serde_json::from_str(&record.body) {
            Ok(message) => message,
            Err(err) => {
                warn!(message_id = %record.message_id, error = %err, "skipping malformed processing message");
                continue;
            }
        };

        if let Err(err) = process_file(config, ocr, queue, &message).await {
            error!(file_key = %message.file_key, error = %err, "text extraction failed");
            response.fail(&record.message_id);
        }
    }
    response
}

async fn process_file(
    config: &ExtractionConfig,
    ocr: &dyn OcrService,
    queue: &dyn MessageQueue,
    message: &ProcessingMessage,
) -> AppResult<()> {
    let text = ocr::extract_text(ocr, config.poll, &message.bucket_name, &message.file_key).await?;
    info!(file_key = %message.file_key, chars = text.len(), "extracted report text");

    let body = fit_message(ExtractionMessage {
        text,
        file_key: message.file_key.clone(),
    })?;
    queue.send(&config.extract_metadata_queue_url, body).await
}

/// Serialises the message, cutting the text at a char boundary until the body fits.
pub fn fit_message(mut message: ExtractionMessage) -> AppResult<String> {
    let mut body = serde_json::to_string(&message)?;
    if body.len() > MAX_MESSAGE_BYTES {
        warn!(file_key = %message.file_key, bytes = body.len(), "truncating extracted text");
    }
    while body.len() > MAX_MESSAGE_BYTES {
        let excess = body.len() - MAX_MESSAGE_BYTES;
        let mut cut = message.text.len().saturating_sub(excess);
        while !message.text.is_char_boundary(cut) {
            cut -= 1;
        }
        message.text.truncate(cut);
        body = serde_json::to_string(&message)?;
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollPolicy;
    use crate::ocr::{BlockKind, OcrBlock};
    use crate::testing::{FakeOcr, FakeQueue};
    use std::time::Duration;

    fn config() -> ExtractionConfig {
        ExtractionConfig {
            extract_metadata_queue_url: "https://sqs/extract-metadata".into(),
            poll: PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: 3,
            },
        }
    }

    fn line(id: &str, text: &str) -> OcrBlock {
        OcrBlock {
            id: id.into(),
            kind: BlockKind::Line,
            text: Some(text.into()),
            row: None,
            column: None,
            children: Vec::new(),
        }
    }

    fn record(id: &str, body: &str) -> QueueRecord {
        QueueRecord {
            message_id: id.into(),
            body: body.into(),
        }
    }

    const PROCESSING: &str =
        r#"{"bucketName":"reports","fileKey":"Files/review.pdf","uniqueId":"u-1"}"#;

    #[tokio::test]
    async fn extracted_text_is_forwarded_with_its_key() {
        let ocr = FakeOcr::succeeding(vec![line("l1", "Schools Reviews")], vec![]);
        let queue = FakeQueue::default();

        let response = process_batch(&config(), &ocr, &queue, &[record("m1", PROCESSING)]).await;

        assert!(response.batch_item_failures.is_empty());
        let sent = queue.bodies();
        assert_eq!(
            sent,
            vec![serde_json::json!({"text": "Schools Reviews", "fileKey": "Files/review.pdf"})]
        );
        assert_eq!(queue.sent.lock().unwrap()[0].0, "https://sqs/extract-metadata");
    }

    #[tokio::test]
    async fn malformed_messages_are_skipped_and_failed_jobs_retried() {
        let ocr = FakeOcr::failing("unsupported document");
        let queue = FakeQueue::default();

        let response = process_batch(
            &config(),
            &ocr,
            &queue,
            &[record("bad", "not json"), record("m2", PROCESSING)],
        )
        .await;

        assert_eq!(response.batch_item_failures.len(), 1);
        assert_eq!(response.batch_item_failures[0].item_identifier, "m2");
        assert!(queue.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn oversized_text_is_cut_to_fit_the_queue() {
        let text = "é".repeat(MAX_MESSAGE_BYTES);
        let body = fit_message(ExtractionMessage {
            text,
            file_key: "Files/big.pdf".into(),
        })
        .unwrap();

        assert!(body.len() <= MAX_MESSAGE_BYTES);
        let decoded: ExtractionMessage = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded.file_key, "Files/big.pdf");
        assert!(decoded.text.chars().all(|c| c == 'é'));
    }

    #[test]
    fn small_messages_are_left_alone() {
        let body = fit_message(ExtractionMessage {
            text: "short".into(),
            file_key: "Files/a.pdf".into(),
        })
        .unwrap();
        assert_eq!(body, r#"{"text":"short","fileKey":"Files/a.pdf"}"#);
    }
}
