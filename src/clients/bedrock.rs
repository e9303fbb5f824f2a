use async_trait::async_trait;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration, Message,
};
use aws_sdk_bedrockruntime::Client;

use super::TextModel;
use crate::error::{AppError, AppResult};

const MAX_TOKENS: i32 = 1000;

#[derive(Clone, Debug)]
pub struct BedrockModel {
    client: Client,
}

impl BedrockModel {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn no_text(reason: &str) -> AppError {
    AppError::ModelOutput(reason.to_string())
}

#[async_trait]
impl TextModel for BedrockModel {
    async fn complete(&self, model_id: &str, prompt: &str) -> AppResult<String> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(prompt.to_string()))
            .build()
            .map_err(|e| AppError::service("bedrock.converse", e))?;

        let output = self
            .client
            .converse()
            .model_id(model_id)
            .messages(message)
            .inference_config(InferenceConfiguration::builder().max_tokens(MAX_TOKENS).build())
            .send()
            .await
            .map_err(|e| AppError::service("bedrock.converse", e))?;

        let Some(ConverseOutput::Message(message)) = output.output else {
            return Err(no_text("no message in model response"));
        };

        let text = message
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(no_text("model response has no text content"));
        }
        Ok(text)
    }
}
