use async_trait::async_trait;
use aws_sdk_lexruntimev2::Client;

use super::{BotTarget, ChatBot};
use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct LexBot {
    client: Client,
}

impl LexBot {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatBot for LexBot {
    async fn recognize_text(
        &self,
        bot: BotTarget<'_>,
        session_id: &str,
        text: &str,
    ) -> AppResult<Vec<String>> {
        let output = self
            .client
            .recognize_text()
            .bot_id(bot.bot_id)
            .bot_alias_id(bot.bot_alias_id)
            .locale_id(bot.locale_id)
            .session_id(session_id)
            .text(text)
            .send()
            .await
            .map_err(|e| AppError::service("lex.recognize_text", e))?;

        Ok(output
            .messages()
            .iter()
            .filter_map(|message| message.content().map(str::to_string))
            .collect())
    }
}
