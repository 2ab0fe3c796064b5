//! Configuration for the Google gateways.

use std::env;

use chrono_tz::Tz;

use crate::error::GoogleApiError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// How API calls are authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Fixed bearer token, used as is.
    AccessToken(String),
    /// OAuth2 refresh-token grant; access tokens are minted and cached.
    RefreshToken {
        client_id: String,
        client_secret: Option<String>,
        refresh_token: String,
        token_uri: String,
    },
}

/// Settings shared by the calendar, ledger and manager gateways.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub spreadsheet_id: String,
    /// Ledger sheet name.
    pub meetings_sheet: String,
    pub managers_sheet: String,
    pub calendar_id: String,
    /// Zone used for event times and day boundaries.
    pub timezone: Tz,
    pub credentials: Credentials,
    pub calendar_base_url: String,
    pub sheets_base_url: String,
}

impl GoogleConfig {
    /// Create a configuration with default sheet names, the primary calendar
    /// and the public API endpoints.
    pub fn new(spreadsheet_id: impl Into<String>, credentials: Credentials, timezone: Tz) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            meetings_sheet: "Meetings".to_string(),
            managers_sheet: "Managers".to_string(),
            calendar_id: "primary".to_string(),
            timezone,
            credentials,
            calendar_base_url: CALENDAR_BASE_URL.to_string(),
            sheets_base_url: SHEETS_BASE_URL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `GOOGLE_SHEET_URL` - spreadsheet URL (or bare id)
    /// - `GOOGLE_ACCESS_TOKEN`, or `GOOGLE_CLIENT_ID` + `GOOGLE_REFRESH_TOKEN`
    ///
    /// Optional:
    /// - `GOOGLE_CLIENT_SECRET`, `GOOGLE_TOKEN_URI`
    /// - `GOOGLE_MEETINGS_SHEET` (default: Meetings)
    /// - `GOOGLE_MANAGERS_SHEET` (default: Managers)
    /// - `GOOGLE_CALENDAR_ID` (default: primary)
    pub fn from_env(timezone: Tz) -> Result<Self, GoogleApiError> {
        Self::from_lookup(timezone, |key| env::var(key).ok())
    }

    /// Same as [`GoogleConfig::from_env`] with a custom variable source.
    pub fn from_lookup(
        timezone: Tz,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GoogleApiError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let sheet_url = get("GOOGLE_SHEET_URL")
            .ok_or_else(|| GoogleApiError::Config("GOOGLE_SHEET_URL not set".to_string()))?;
        let spreadsheet_id = spreadsheet_id_from_url(&sheet_url).ok_or_else(|| {
            GoogleApiError::Config(format!("cannot find a spreadsheet id in {}", sheet_url))
        })?;

        let credentials = match (
            get("GOOGLE_ACCESS_TOKEN"),
            get("GOOGLE_CLIENT_ID"),
            get("GOOGLE_REFRESH_TOKEN"),
        ) {
            (_, Some(client_id), Some(refresh_token)) => Credentials::RefreshToken {
                client_id,
                client_secret: get("GOOGLE_CLIENT_SECRET"),
                refresh_token,
                token_uri: get("GOOGLE_TOKEN_URI").unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            },
            (Some(token), _, _) => Credentials::AccessToken(token),
            _ => {
                return Err(GoogleApiError::Config(
                    "set GOOGLE_ACCESS_TOKEN, or GOOGLE_CLIENT_ID and GOOGLE_REFRESH_TOKEN"
                        .to_string(),
                ))
            }
        };

        let mut config = Self::new(spreadsheet_id, credentials, timezone);
        if let Some(name) = get("GOOGLE_MEETINGS_SHEET") {
            config.meetings_sheet = name;
        }
        if let Some(name) = get("GOOGLE_MANAGERS_SHEET") {
            config.managers_sheet = name;
        }
        if let Some(id) = get("GOOGLE_CALENDAR_ID") {
            config.calendar_id = id;
        }
        Ok(config)
    }
}

/// Extract the spreadsheet id from a `.../spreadsheets/d/<id>/...` URL.
/// A value without `/` is taken as the id itself.
pub fn spreadsheet_id_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    if !url.contains('/') {
        return (!url.is_empty()).then(|| url.to_string());
    }

    let (_, rest) = url.split_once("/spreadsheets/d/")?;
    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!id.is_empty()).then_some(id)
}
