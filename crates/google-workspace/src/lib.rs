//! Google Calendar and Google Sheets gateways for the meetings bot.
//!
//! - [`GoogleCalendar`] implements [`meeting_core::CalendarGateway`] on
//!   Calendar API v3
//! - [`SheetsLedger`] implements [`meeting_core::LedgerGateway`] on the
//!   meetings sheet, creating it and its header row when missing
//! - [`SheetsManagerDirectory`] implements [`meeting_core::ManagerDirectory`]
//!   on the managers sheet
//!
//! All three share one [`GoogleClient`], which attaches a bearer token from
//! either a fixed access token or an OAuth2 refresh-token grant.
//!
//! # Example
//!
//! ```rust,ignore
//! use google_workspace::{GoogleConfig, GoogleGateways};
//!
//! let config = GoogleConfig::from_env(chrono_tz::Asia::Almaty)?;
//! let gateways = GoogleGateways::connect(&config)?;
//! let managers = gateways.directory.list().await?;
//! ```

mod auth;
mod calendar;
mod client;
mod config;
mod error;
mod ledger;
mod managers;
mod sheets;

pub use auth::TokenProvider;
pub use calendar::GoogleCalendar;
pub use client::GoogleClient;
pub use config::{
    spreadsheet_id_from_url, Credentials, GoogleConfig, CALENDAR_BASE_URL, DEFAULT_TOKEN_URI,
    SHEETS_BASE_URL,
};
pub use error::GoogleApiError;
pub use ledger::SheetsLedger;
pub use managers::SheetsManagerDirectory;
pub use sheets::{a1_range, column_letter, normalize_header, SheetsClient};

/// The three gateways built over one shared client.
pub struct GoogleGateways {
    pub calendar: GoogleCalendar,
    pub ledger: SheetsLedger,
    pub directory: SheetsManagerDirectory,
}

impl GoogleGateways {
    /// Build all gateways from `config`.
    pub fn connect(config: &GoogleConfig) -> Result<Self, GoogleApiError> {
        let client = GoogleClient::new(config.credentials.clone())?;
        let sheets = SheetsClient::new(client.clone(), config);
        Ok(Self {
            calendar: GoogleCalendar::new(client, config),
            ledger: SheetsLedger::new(sheets.clone(), config),
            directory: SheetsManagerDirectory::new(sheets, config),
        })
    }
}
