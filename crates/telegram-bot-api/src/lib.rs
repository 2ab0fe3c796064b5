//! Minimal Telegram Bot API client.
//!
//! Covers what a button-driven chat bot needs:
//!
//! - Receiving updates via long polling ([`updates`])
//! - Sending HTML messages with inline keyboards, optionally into forum topics
//! - Acknowledging callback queries
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use telegram_bot_api::{BotConfig, SendMessageParams, TelegramClient};
//!
//! # async fn example() -> Result<(), telegram_bot_api::BotApiError> {
//! let client = TelegramClient::new(BotConfig::from_env()?)?;
//!
//! let mut updates = Box::pin(telegram_bot_api::updates(client.clone()));
//! while let Some(update) = updates.next().await {
//!     if let Some(message) = update.message {
//!         let reply = SendMessageParams::html(message.chat.id, "<b>Hello!</b>");
//!         client.send_message(&reply).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod types;

pub use client::TelegramClient;
pub use config::{BotConfig, DEFAULT_API_BASE_URL, DEFAULT_POLL_TIMEOUT_SECS};
pub use error::BotApiError;
pub use poller::{next_offset, updates, ERROR_PAUSE};
pub use types::*;
