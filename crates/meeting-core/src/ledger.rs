//! Spreadsheet ledger mirroring every meeting.

use async_trait::async_trait;
use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::error::Result;
use crate::meeting::MeetingStatus;

/// Ledger columns, in sheet order.
pub const LEDGER_COLUMNS: [&str; 16] = [
    "created_at",
    "created_by_id",
    "created_by_username",
    "chat_id",
    "thread_id",
    "client",
    "date",
    "time",
    "start_iso",
    "end_iso",
    "manager_name",
    "manager_username",
    "manager_telegram_id",
    "comment",
    "event_id",
    "status",
];

/// One ledger row. Unknown values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRow {
    pub created_at: String,
    pub created_by_id: String,
    pub created_by_username: String,
    pub chat_id: String,
    pub thread_id: String,
    pub client: String,
    /// `DD.MM.YYYY`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub start_iso: String,
    pub end_iso: String,
    pub manager_name: String,
    pub manager_username: String,
    pub manager_telegram_id: String,
    pub comment: String,
    pub event_id: String,
    pub status: String,
}

impl LedgerRow {
    /// Values in [`LEDGER_COLUMNS`] order.
    pub fn to_values(&self) -> Vec<String> {
        LEDGER_COLUMNS
            .iter()
            .map(|column| self.get(column).unwrap_or_default().to_string())
            .collect()
    }

    /// Build a row from values in [`LEDGER_COLUMNS`] order. Short rows are padded.
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Self {
        let mut row = Self::default();
        for (column, value) in LEDGER_COLUMNS.iter().zip(values) {
            row.set(column, value.as_ref().trim());
        }
        row
    }

    /// Value of a named column.
    pub fn get(&self, column: &str) -> Option<&str> {
        let value = match column {
            "created_at" => &self.created_at,
            "created_by_id" => &self.created_by_id,
            "created_by_username" => &self.created_by_username,
            "chat_id" => &self.chat_id,
            "thread_id" => &self.thread_id,
            "client" => &self.client,
            "date" => &self.date,
            "time" => &self.time,
            "start_iso" => &self.start_iso,
            "end_iso" => &self.end_iso,
            "manager_name" => &self.manager_name,
            "manager_username" => &self.manager_username,
            "manager_telegram_id" => &self.manager_telegram_id,
            "comment" => &self.comment,
            "event_id" => &self.event_id,
            "status" => &self.status,
            _ => return None,
        };
        Some(value)
    }

    /// Set a named column. Returns false for unknown columns.
    pub fn set(&mut self, column: &str, value: impl Into<String>) -> bool {
        let slot = match column {
            "created_at" => &mut self.created_at,
            "created_by_id" => &mut self.created_by_id,
            "created_by_username" => &mut self.created_by_username,
            "chat_id" => &mut self.chat_id,
            "thread_id" => &mut self.thread_id,
            "client" => &mut self.client,
            "date" => &mut self.date,
            "time" => &mut self.time,
            "start_iso" => &mut self.start_iso,
            "end_iso" => &mut self.end_iso,
            "manager_name" => &mut self.manager_name,
            "manager_username" => &mut self.manager_username,
            "manager_telegram_id" => &mut self.manager_telegram_id,
            "comment" => &mut self.comment,
            "event_id" => &mut self.event_id,
            "status" => &mut self.status,
            _ => return false,
        };
        *slot = value.into();
        true
    }

    /// Apply every known column of a patch.
    pub fn apply(&mut self, patch: &LedgerPatch) {
        for (column, value) in patch.iter() {
            self.set(column, value);
        }
    }
}

/// Named column updates for one ledger row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerPatch {
    values: IndexMap<String, String>,
}

impl LedgerPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column. Names outside [`LEDGER_COLUMNS`] are kept but ignored by gateways.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn status(self, status: MeetingStatus) -> Self {
        self.set("status", status.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Row store keyed by calendar event id.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Append a row, provisioning the header row on first use.
    async fn append(&self, row: &LedgerRow) -> Result<()>;

    /// Find the row whose `event_id` matches.
    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<LedgerRow>>;

    /// Update named columns of the matching row.
    ///
    /// Returns `false` when no row matches. Unknown column names are ignored.
    async fn patch_by_event_id(&self, event_id: &str, patch: &LedgerPatch) -> Result<bool>;

    /// Rows scheduled on `date`, ordered by time.
    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<LedgerRow>>;
}
