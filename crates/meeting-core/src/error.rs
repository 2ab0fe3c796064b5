//! Error types for gateway operations.

use thiserror::Error;

/// Errors reported by calendar, ledger and manager directory backends.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A record with the same identifier already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Transport-level failure (connection, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Stored data does not have the expected shape (e.g. a foreign header row).
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// Authentication or credentials problem.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Shorthand for a calendar event lookup miss.
    pub fn event_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "event",
            id: id.into(),
        }
    }

    /// Whether this error is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
