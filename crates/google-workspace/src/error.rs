//! Error types for the Google gateways.

use meeting_core::GatewayError;
use thiserror::Error;

/// Errors that can occur when talking to Google APIs.
#[derive(Debug, Error)]
pub enum GoogleApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Access token rejected, or the refresh token was revoked.
    #[error("Token expired or revoked")]
    AuthExpired,

    /// Token refresh failed for another reason.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Non-success response from the API.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GoogleApiError {
    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Convert, attributing 404/410 and 409 to `entity` with `id`.
    pub fn for_entity(self, entity: &'static str, id: &str) -> GatewayError {
        match self.status() {
            Some(404) | Some(410) => GatewayError::NotFound {
                entity,
                id: id.to_string(),
            },
            Some(409) => GatewayError::AlreadyExists {
                entity,
                id: id.to_string(),
            },
            _ => self.into(),
        }
    }
}

impl From<GoogleApiError> for GatewayError {
    fn from(err: GoogleApiError) -> Self {
        match err {
            GoogleApiError::Http(e) if e.is_decode() => GatewayError::InvalidResponse(e.to_string()),
            GoogleApiError::Http(e) => GatewayError::Network(e.to_string()),
            GoogleApiError::Json(e) => GatewayError::InvalidResponse(e.to_string()),
            GoogleApiError::AuthExpired => GatewayError::Auth("token expired or revoked".to_string()),
            GoogleApiError::RefreshFailed(message) => GatewayError::Auth(message),
            GoogleApiError::Api { status, message } => GatewayError::Api { status, message },
            GoogleApiError::Config(message) => GatewayError::Auth(message),
        }
    }
}
