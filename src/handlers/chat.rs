//! Relays a chat message to the Lex bot and returns its replies.

use lambda_runtime::Error;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiResponse, DirectResponse};
use crate::clients::{BotTarget, ChatBot};
use crate::config::BotConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::{log_failure, required_field};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ChatReply {
    pub messages: Vec<String>,
}

pub async fn function_handler(
    bot: &dyn ChatBot,
    request: ChatRequest,
) -> Result<DirectResponse, Error> {
    let result = match BotConfig::from_env() {
        Ok(config) => send_message(&config, bot, request).await,
        Err(err) => Err(err),
    };
    let reply = result.and_then(|reply| {
        Ok(DirectResponse::ok(
            ApiResponse::success(serde_json::to_value(reply)?)
                .with_message("Response received successfully"),
        ))
    });
    Ok(reply.unwrap_or_else(|err| {
        log_failure(&err);
        DirectResponse::failure(&err)
    }))
}

pub async fn send_message(
    config: &BotConfig,
    bot: &dyn ChatBot,
    request: ChatRequest,
) -> AppResult<ChatReply> {
    let text = required_field(request.message)
        .ok_or_else(|| AppError::invalid("Empty text cannot be sent"))?;
    let session_id =
        required_field(request.session_id).ok_or_else(|| AppError::invalid("sessionId is required"))?;

    let target = BotTarget {
        bot_id: &config.bot_id,
        bot_alias_id: &config.bot_alias_id,
        locale_id: &config.locale_id,
    };
    let messages = bot.recognize_text(target, &session_id, &text).await?;
    info!(%session_id, replies = messages.len(), "bot replied");
    Ok(ChatReply { messages })
}
