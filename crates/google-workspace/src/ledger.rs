//! Meetings ledger stored in a spreadsheet sheet.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use meeting_core::{
    async_trait, format_date, GatewayError, LedgerGateway, LedgerPatch, LedgerRow, Result,
    LEDGER_COLUMNS,
};
use tracing::{debug, info, warn};

use crate::config::GoogleConfig;
use crate::sheets::{a1_range, cell, column_letter, normalize_header, SheetsClient};

const NEW_SHEET_ROWS: u32 = 2000;

/// Ledger gateway over the meetings sheet.
///
/// The sheet is created on first use when missing, and an empty sheet gets
/// the header row. A sheet whose first row is not the expected header is
/// never written to.
pub struct SheetsLedger {
    sheets: SheetsClient,
    sheet: String,
    sheet_exists: AtomicBool,
}

impl SheetsLedger {
    pub fn new(sheets: SheetsClient, config: &GoogleConfig) -> Self {
        Self {
            sheets,
            sheet: config.meetings_sheet.clone(),
            sheet_exists: AtomicBool::new(false),
        }
    }

    async fn ensure_sheet(&self) -> Result<()> {
        if self.sheet_exists.load(Ordering::SeqCst) {
            return Ok(());
        }

        let titles = self.sheets.sheet_titles().await?;
        if !titles.iter().any(|t| t == &self.sheet) {
            info!("Creating ledger sheet {:?}", self.sheet);
            self.sheets
                .add_sheet(&self.sheet, NEW_SHEET_ROWS, LEDGER_COLUMNS.len() as u32)
                .await?;
        }
        self.sheet_exists.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// All rows including the header, provisioning the sheet as needed.
    async fn load(&self) -> Result<Vec<Vec<String>>> {
        self.ensure_sheet().await?;

        let values = self.sheets.get_values(&a1_range(&self.sheet, "A:Z")).await?;
        if values.is_empty() {
            let header: Vec<String> = LEDGER_COLUMNS.iter().map(|c| c.to_string()).collect();
            self.sheets
                .append_row(&a1_range(&self.sheet, "A1"), &header)
                .await?;
            info!("Wrote ledger header to {:?}", self.sheet);
            return Ok(vec![header]);
        }

        check_header(&values[0], &self.sheet)?;
        Ok(values)
    }
}

#[async_trait]
impl LedgerGateway for SheetsLedger {
    async fn append(&self, row: &LedgerRow) -> Result<()> {
        self.load().await?;
        self.sheets
            .append_row(&a1_range(&self.sheet, "A1"), &row.to_values())
            .await?;
        debug!("Appended ledger row for {}", row.event_id);
        Ok(())
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<LedgerRow>> {
        let values = self.load().await?;
        Ok(find_row(&values, event_id).map(|(_, row)| row))
    }

    async fn patch_by_event_id(&self, event_id: &str, patch: &LedgerPatch) -> Result<bool> {
        let values = self.load().await?;
        let Some((index, _)) = find_row(&values, event_id) else {
            warn!("No ledger row for event {}", event_id);
            return Ok(false);
        };
        // Sheet rows are 1-based and the header is row 1.
        let sheet_row = index + 1;

        for (column, value) in patch.iter() {
            let wanted = normalize_header(column);
            let Some(col) = LEDGER_COLUMNS.iter().position(|c| *c == wanted) else {
                debug!("Skipping unknown ledger column {:?}", column);
                continue;
            };
            let range = a1_range(&self.sheet, &format!("{}{}", column_letter(col), sheet_row));
            self.sheets.update_row(&range, &[value.to_string()]).await?;
        }

        debug!("Patched ledger row {} for {}", sheet_row, event_id);
        Ok(true)
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<LedgerRow>> {
        let values = self.load().await?;
        Ok(rows_for_date(&values, date))
    }
}

/// Verify that `first` starts with the ledger header.
fn check_header(first: &[String], sheet: &str) -> Result<()> {
    let matches = first.len() >= LEDGER_COLUMNS.len()
        && LEDGER_COLUMNS
            .iter()
            .zip(first)
            .all(|(expected, actual)| normalize_header(actual) == *expected);

    if matches {
        Ok(())
    } else {
        Err(GatewayError::Schema(format!(
            "sheet {:?} exists but its header does not match; expected {}",
            sheet,
            LEDGER_COLUMNS.join(", ")
        )))
    }
}

fn event_id_column() -> usize {
    LEDGER_COLUMNS
        .iter()
        .position(|c| *c == "event_id")
        .unwrap_or(LEDGER_COLUMNS.len() - 2)
}

/// First data row whose event id matches, with its index in `values`.
fn find_row(values: &[Vec<String>], event_id: &str) -> Option<(usize, LedgerRow)> {
    let wanted = event_id.trim();
    let col = event_id_column();
    values
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| cell(row, col).trim() == wanted)
        .map(|(index, row)| (index, LedgerRow::from_values(row)))
}

/// Data rows on `date`, sorted by time.
fn rows_for_date(values: &[Vec<String>], date: NaiveDate) -> Vec<LedgerRow> {
    let wanted = format_date(date);
    let mut rows: Vec<LedgerRow> = values
        .iter()
        .skip(1)
        .map(|row| LedgerRow::from_values(row))
        .filter(|row| row.date == wanted)
        .collect();
    rows.sort_by(|a, b| a.time.cmp(&b.time));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        LEDGER_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn data(event_id: &str, date: &str, time: &str) -> Vec<String> {
        LedgerRow {
            client: format!("client-{}", event_id),
            date: date.to_string(),
            time: time.to_string(),
            event_id: event_id.to_string(),
            status: "created".to_string(),
            ..Default::default()
        }
        .to_values()
    }

    #[test]
    fn test_header_check_normalizes() {
        let mut first = header();
        first[0] = " Created_At ".to_string();
        first.push("notes".to_string());
        assert!(check_header(&first, "Meetings").is_ok());
    }

    #[test]
    fn test_foreign_header_rejected() {
        let mut first = header();
        first.swap(0, 1);
        assert!(matches!(check_header(&first, "Meetings"), Err(GatewayError::Schema(_))));
        assert!(check_header(&header()[..5], "Meetings").is_err());
    }

    #[test]
    fn test_find_row_skips_header_and_trims() {
        let mut row = data("evt2", "05.02.2026", "11:00");
        row[event_id_column()] = " evt2 ".to_string();
        let values = vec![header(), data("evt1", "05.02.2026", "10:00"), row];

        let (index, found) = find_row(&values, "evt2").unwrap();
        assert_eq!(index, 2);
        assert_eq!(found.client, "client-evt2");
        assert!(find_row(&values, "event_id").is_none());
        assert!(find_row(&values, "missing").is_none());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let values = vec![header(), vec!["2026-02-05 09:00:00".to_string()]];
        assert!(find_row(&values, "evt1").is_none());
        assert!(rows_for_date(&values, NaiveDate::from_ymd_opt(2026, 2, 5).unwrap()).is_empty());
    }

    #[test]
    fn test_rows_for_date_sorted_by_time() {
        let values = vec![
            header(),
            data("late", "05.02.2026", "16:00"),
            data("other", "06.02.2026", "09:00"),
            data("early", "05.02.2026", "10:00"),
        ];

        let rows = rows_for_date(&values, NaiveDate::from_ymd_opt(2026, 2, 5).unwrap());
        let ids: Vec<&str> = rows.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }
}
