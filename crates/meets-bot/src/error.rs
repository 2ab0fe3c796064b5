//! Error types for the bot crate.

use google_workspace::GoogleApiError;
use meets_dialog::DialogError;
use telegram_bot_api::BotApiError;
use thiserror::Error;

/// Errors that stop the bot from starting.
#[derive(Debug, Error)]
pub enum BotError {
    /// Telegram client or configuration error.
    #[error("telegram error: {0}")]
    Telegram(#[from] BotApiError),

    /// Google client or configuration error.
    #[error("google error: {0}")]
    Google(#[from] GoogleApiError),

    /// Dialog configuration error.
    #[error("dialog error: {0}")]
    Dialog(#[from] DialogError),
}
