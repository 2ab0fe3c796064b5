//! Authorized HTTP access shared by the Google gateways.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::TokenProvider;
use crate::config::Credentials;
use crate::error::GoogleApiError;

/// Google's JSON error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Bearer-authorized JSON client, cheap to clone.
#[derive(Clone)]
pub struct GoogleClient {
    http: Client,
    auth: Arc<TokenProvider>,
}

impl GoogleClient {
    pub fn new(credentials: Credentials) -> Result<Self, GoogleApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(GoogleApiError::Http)?;
        let auth = Arc::new(TokenProvider::new(http.clone(), credentials));
        Ok(Self { http, auth })
    }

    /// GET and decode a JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GoogleApiError> {
        let resp = self.send(self.http.get(url).query(query)).await?;
        Ok(resp.json().await?)
    }

    /// Send a JSON body and decode the JSON response.
    pub async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, GoogleApiError> {
        let resp = self
            .send(self.http.request(method, url).query(query).json(body))
            .await?;
        Ok(resp.json().await?)
    }

    /// DELETE, ignoring the response body.
    pub async fn delete(&self, url: &str) -> Result<(), GoogleApiError> {
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GoogleApiError> {
        let token = self.auth.access_token().await?;
        let resp = request.bearer_auth(token).send().await?;

        let status = resp.status();
        debug!("Google API {} {}", status.as_u16(), resp.url().path());
        if status == StatusCode::UNAUTHORIZED {
            self.auth.invalidate().await;
            return Err(GoogleApiError::AuthExpired);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GoogleApiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(resp)
    }
}

/// The `error.message` of a Google error body, else the raw body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_envelope() {
        let body = r#"{"error":{"code":404,"message":"Not Found","status":"NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "Not Found");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("  bad gateway \n"), "bad gateway");
        assert_eq!(error_message(r#"{"error":{}}"#), r#"{"error":{}}"#);
    }
}
