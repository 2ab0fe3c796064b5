//! Manager directory read from a spreadsheet sheet.

use meeting_core::{async_trait, GatewayError, ManagerDirectory, ManagerEntry, Result};
use tracing::debug;

use crate::config::GoogleConfig;
use crate::sheets::{a1_range, cell, normalize_header, SheetsClient};

const ID_HEADERS: &[&str] = &["telegram_id", "telegramid", "tgid", "id"];
const NAME_HEADERS: &[&str] = &["name", "manager", "fullname"];
const USERNAME_HEADERS: &[&str] = &[
    "username",
    "tgusername",
    "telegramusername",
    "@username",
    "user",
];

/// Managers listed in the managers sheet, read on every call.
pub struct SheetsManagerDirectory {
    sheets: SheetsClient,
    sheet: String,
}

impl SheetsManagerDirectory {
    pub fn new(sheets: SheetsClient, config: &GoogleConfig) -> Self {
        Self {
            sheets,
            sheet: config.managers_sheet.clone(),
        }
    }
}

#[async_trait]
impl ManagerDirectory for SheetsManagerDirectory {
    async fn list(&self) -> Result<Vec<ManagerEntry>> {
        let values = self.sheets.get_values(&a1_range(&self.sheet, "A:Z")).await?;
        let managers = parse_managers(&values, &self.sheet)?;
        debug!("Loaded {} managers from {:?}", managers.len(), self.sheet);
        Ok(managers)
    }
}

/// First header position matching any alias, in alias order.
fn header_index(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h.as_str() == *alias))
}

/// Managers from sheet values whose first row is the header.
fn parse_managers(values: &[Vec<String>], sheet: &str) -> Result<Vec<ManagerEntry>> {
    let Some((first, rows)) = values.split_first() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = first.iter().map(|h| normalize_header(h)).collect();

    let (Some(id_col), Some(name_col)) = (
        header_index(&headers, ID_HEADERS),
        header_index(&headers, NAME_HEADERS),
    ) else {
        return Err(GatewayError::Schema(format!(
            "sheet {:?} must have telegram_id and name columns",
            sheet
        )));
    };
    let username_col = header_index(&headers, USERNAME_HEADERS);

    Ok(rows
        .iter()
        .filter_map(|row| {
            let telegram_id = cell(row, id_col).trim();
            let name = cell(row, name_col).trim();
            if telegram_id.is_empty() && name.is_empty() {
                return None;
            }
            let username = username_col.map(|c| cell(row, c).trim()).unwrap_or("");
            Some(ManagerEntry::new(telegram_id, name, username))
        })
        .collect())
}
