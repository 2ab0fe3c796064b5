//! Configuration types for telegram-bot-api.

use std::env;

use crate::error::BotApiError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Configuration for talking to the Bot API.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot token from BotFather.
    pub token: String,
    /// API server (e.g. "https://api.telegram.org" or a local Bot API server).
    pub api_base_url: String,
    /// Long-poll timeout for getUpdates.
    pub poll_timeout_secs: u64,
}

impl BotConfig {
    /// Create a configuration for the public API server.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }

    /// Use a different API server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// - `TELEGRAM_BOT_TOKEN` (required)
    /// - `TELEGRAM_API_BASE_URL` (default: https://api.telegram.org)
    /// - `TELEGRAM_POLL_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, BotApiError> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BotApiError::Config("TELEGRAM_BOT_TOKEN not set".to_string()))?;

        let mut config = Self::new(token.trim());
        if let Ok(base_url) = env::var("TELEGRAM_API_BASE_URL") {
            if !base_url.trim().is_empty() {
                config = config.with_base_url(base_url.trim());
            }
        }
        if let Ok(timeout) = env::var("TELEGRAM_POLL_TIMEOUT_SECS") {
            config.poll_timeout_secs = timeout.trim().parse().map_err(|_| {
                BotApiError::Config(format!("invalid TELEGRAM_POLL_TIMEOUT_SECS: {}", timeout))
            })?;
        }
        Ok(config)
    }

    /// Get the endpoint URL of a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.token, method)
    }
}
