//! Error types for the dialog crate.

use meeting_core::GatewayError;
use thiserror::Error;

/// Errors surfaced outside the state machine.
///
/// Gateway failures inside a dialog step become replies, not errors.
#[derive(Debug, Error)]
pub enum DialogError {
    /// Invalid or missing configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reply delivery failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// A gateway call failed outside a dialog step.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
