//! Access tokens for Google API calls.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::error::GoogleApiError;

/// Seconds before expiry at which a cached token is refreshed.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

/// Hands out bearer tokens, refreshing them when needed.
///
/// Concurrent callers share one refresh: the cache lock is held while the
/// token endpoint is called.
#[derive(Debug)]
pub struct TokenProvider {
    http: Client,
    credentials: Credentials,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: Client, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// A currently valid access token.
    pub async fn access_token(&self) -> Result<String, GoogleApiError> {
        let (client_id, client_secret, refresh_token, token_uri) = match &self.credentials {
            Credentials::AccessToken(token) => return Ok(token.clone()),
            Credentials::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => (client_id, client_secret, refresh_token, token_uri),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }

        debug!("Refreshing Google access token");
        let mut form = vec![
            ("client_id", client_id.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let resp = self.http.post(token_uri).form(&form).send().await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_refresh_error(status.as_u16(), &body));
        }

        let token = parse_token_response(&body, Utc::now())?;
        info!("Google access token refreshed, valid until {}", token.expires_at);
        let access = token.token.clone();
        *cached = Some(token);
        Ok(access)
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

fn parse_token_response(body: &str, now: DateTime<Utc>) -> Result<CachedToken, GoogleApiError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| GoogleApiError::RefreshFailed(format!("bad token response: {}", e)))?;
    let expires_in = parsed.expires_in.unwrap_or(3600);
    Ok(CachedToken {
        token: parsed.access_token,
        expires_at: now + Duration::seconds(expires_in as i64),
    })
}

fn map_refresh_error(status: u16, body: &str) -> GoogleApiError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        return GoogleApiError::AuthExpired;
    }
    GoogleApiError::RefreshFailed(format!("HTTP {}: {}", status, body))
}
