//! Telegram Bot API transport

use super::Notifier;
use crate::config::TelegramConfig;
use crate::error::NotifyError;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self::with_client(&config.api_url, &config.bot_token, client))
    }

    pub fn with_client(api_url: &str, bot_token: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let response = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: recipient,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(recipient = %recipient, "Telegram: message delivered");
        Ok(())
    }
}
