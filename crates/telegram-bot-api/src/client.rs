//! Bot API HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BotConfig;
use crate::error::BotApiError;
use crate::types::{
    AnswerCallbackQueryParams, GetUpdatesParams, Message, SendMessageParams, Update, User,
};

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i32>,
    #[serde(default)]
    description: Option<String>,
}

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    config: BotConfig,
}

impl TelegramClient {
    /// Create a client. The HTTP timeout outlasts the long-poll timeout.
    pub fn new(config: BotConfig) -> Result<Self, BotApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 15))
            .build()
            .map_err(BotApiError::Http)?;
        Ok(Self { http, config })
    }

    /// Get the bot's own account.
    pub async fn get_me(&self) -> Result<User, BotApiError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, BotApiError> {
        let params = GetUpdatesParams::long_poll(offset, self.config.poll_timeout_secs);
        self.call("getUpdates", &params).await
    }

    /// Send a message.
    pub async fn send_message(&self, params: &SendMessageParams) -> Result<Message, BotApiError> {
        self.call("sendMessage", params).await
    }

    /// Acknowledge a button press so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), BotApiError> {
        let params = AnswerCallbackQueryParams {
            callback_query_id: callback_query_id.to_string(),
            text: None,
        };
        let _: bool = self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Call a Bot API method with a JSON body.
    async fn call<P: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, BotApiError> {
        debug!("Bot API call: {}", method);

        let response = self
            .http
            .post(self.config.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(BotApiError::Http)?;

        // Error responses carry a JSON envelope too, so decode regardless of status.
        let status = response.status();
        let body = response.text().await.map_err(BotApiError::Http)?;
        let envelope: ApiResponse<R> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                BotApiError::Json(e)
            } else {
                BotApiError::Api {
                    code: i32::from(status.as_u16()),
                    description: body.trim().to_string(),
                }
            }
        })?;

        unwrap_envelope(envelope, status.as_u16())
    }
}

fn unwrap_envelope<R>(envelope: ApiResponse<R>, status: u16) -> Result<R, BotApiError> {
    if !envelope.ok {
        return Err(BotApiError::Api {
            code: envelope.error_code.unwrap_or(i32::from(status)),
            description: envelope.description.unwrap_or_default(),
        });
    }
    envelope.result.ok_or_else(|| BotApiError::Api {
        code: -1,
        description: "No result in response".to_string(),
    })
}
