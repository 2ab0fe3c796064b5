//! Google Sheets API v4 value access.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::client::GoogleClient;
use crate::config::GoogleConfig;
use crate::error::GoogleApiError;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct ValueBody<'a> {
    values: Vec<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(default)]
    title: String,
}

/// Value-level access to one spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    client: GoogleClient,
    base_url: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(client: GoogleClient, config: &GoogleConfig) -> Self {
        Self {
            client,
            base_url: config.sheets_base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
        }
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id)
        )
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/values/{}", self.spreadsheet_url(), urlencoding::encode(range))
    }

    /// Titles of all sheets in the spreadsheet.
    pub async fn sheet_titles(&self) -> Result<Vec<String>, GoogleApiError> {
        let spreadsheet: Spreadsheet = self
            .client
            .get_json(&self.spreadsheet_url(), &[("fields", "sheets.properties.title")])
            .await?;
        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    /// Add a sheet with the given title and size.
    pub async fn add_sheet(&self, title: &str, rows: u32, columns: u32) -> Result<(), GoogleApiError> {
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": {"rowCount": rows, "columnCount": columns}
                    }
                }
            }]
        });
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let _: serde_json::Value = self.client.send_json(Method::POST, &url, &[], &body).await?;
        info!("Added sheet {:?}", title);
        Ok(())
    }

    /// All values in `range`, as displayed strings. Trailing empty cells are
    /// omitted by the API, so rows may be short.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, GoogleApiError> {
        let range: ValueRange = self.client.get_json(&self.values_url(range), &[]).await?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Append one row after the table found in `range`.
    pub async fn append_row(&self, range: &str, row: &[String]) -> Result<(), GoogleApiError> {
        let url = format!("{}:append", self.values_url(range));
        let body = ValueBody { values: vec![row] };
        let _: serde_json::Value = self
            .client
            .send_json(
                Method::POST,
                &url,
                &[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")],
                &body,
            )
            .await?;
        Ok(())
    }

    /// Overwrite the cells of `range` with one row of values.
    pub async fn update_row(&self, range: &str, row: &[String]) -> Result<(), GoogleApiError> {
        let body = ValueBody { values: vec![row] };
        let _: serde_json::Value = self
            .client
            .send_json(
                Method::PUT,
                &self.values_url(range),
                &[("valueInputOption", "RAW")],
                &body,
            )
            .await?;
        Ok(())
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `'Sheet name'!range`, quoting the sheet name.
pub fn a1_range(sheet: &str, range: &str) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), range)
}

/// Column letters for a zero-based column index (0 = A, 26 = AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Lowercase and strip all whitespace, for header comparison.
pub fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Cell of `row` at `index`, empty when the row is short.
pub(crate) fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_range_quotes_name() {
        assert_eq!(a1_range("Meetings", "A:Z"), "'Meetings'!A:Z");
        assert_eq!(a1_range("Bob's list", "A1"), "'Bob''s list'!A1");
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(15), "P");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Telegram ID "), "telegramid");
        assert_eq!(normalize_header("event_id"), "event_id");
        assert_eq!(normalize_header("Full\tName"), "fullname");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(serde_json::json!("x")), "x");
        assert_eq!(cell_text(serde_json::json!(42)), "42");
        assert_eq!(cell_text(serde_json::Value::Null), "");
    }
}
