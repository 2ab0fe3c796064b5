//! Telegram front end for the meetings dialog.
//!
//! ```text
//! getUpdates ──► classify ──► MeetingDialog ──► TelegramSender ──► sendMessage
//!   (poller)    (routing)     (meets-dialog)      (sender)
//! ```
//!
//! Each update is handled on its own: a failure while processing one is
//! logged and the loop moves on to the next.

mod error;
mod processor;
mod routing;
mod sender;

use std::sync::Arc;

use google_workspace::{GoogleConfig, GoogleGateways};
use meeting_core::SystemClock;
use meets_dialog::{MeetingDialog, MeetsConfig};
use telegram_bot_api::{BotConfig, TelegramClient};

pub use error::BotError;
pub use processor::{dispatch, ProcessResult, UpdateProcessor};
pub use routing::{actor_from_user, classify, is_routed, Inbound};
pub use sender::{send_params, TelegramSender};

/// Dialog backed by the Google gateways, in the zone from `meets`.
pub fn google_dialog(meets: &MeetsConfig) -> Result<MeetingDialog, BotError> {
    let config = GoogleConfig::from_env(meets.timezone)?;
    let gateways = GoogleGateways::connect(&config)?;

    Ok(MeetingDialog::new(
        Arc::new(gateways.calendar),
        Arc::new(gateways.ledger),
        Arc::new(gateways.directory),
        Arc::new(SystemClock::new(meets.timezone)),
    ))
}

/// Telegram client and sender built from the environment.
pub fn telegram_from_env() -> Result<(TelegramClient, TelegramSender), BotError> {
    let client = TelegramClient::new(BotConfig::from_env()?)?;
    let sender = TelegramSender::new(client.clone());
    Ok((client, sender))
}
