use async_trait::async_trait;
use aws_sdk_sqs::Client;
use uuid::Uuid;

use super::MessageQueue;
use crate::error::{AppError, AppResult};

const MESSAGE_GROUP: &str = "reports";

#[derive(Clone, Debug)]
pub struct SqsQueue {
    client: Client,
}

impl SqsQueue {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn send(&self, queue_url: &str, body: String) -> AppResult<()> {
        let mut request = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body);

        // FIFO queues reject messages without a group id.
        if queue_url.ends_with(".fifo") {
            request = request
                .message_group_id(MESSAGE_GROUP)
                .message_deduplication_id(Uuid::new_v4().to_string());
        }

        request
            .send()
            .await
            .map_err(|e| AppError::service("sqs.send_message", e))?;
        Ok(())
    }
}
