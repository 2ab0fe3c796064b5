//! Parsing of operator-typed dates and times.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;

/// Rejected date or time input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("expected DD.MM or DD.MM.YYYY, got {0:?}")]
    DateFormat(String),

    #[error("no such calendar date: {0:?}")]
    InvalidDate(String),

    #[error("expected HH:MM, got {0:?}")]
    TimeFormat(String),

    #[error("local time {0} does not exist in the configured time zone")]
    NonexistentLocalTime(NaiveDateTime),
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{2})\.(\d{2})(?:\.(\d{4}))?$").expect("valid date pattern"))
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid time pattern"))
}

/// Parse `DD.MM` or `DD.MM.YYYY`; a missing year is `current_year`.
pub fn parse_date(input: &str, current_year: i32) -> Result<NaiveDate, InputError> {
    let input = input.trim();
    let caps = date_pattern()
        .captures(input)
        .ok_or_else(|| InputError::DateFormat(input.to_string()))?;

    let day: u32 = caps[1]
        .parse()
        .map_err(|_| InputError::DateFormat(input.to_string()))?;
    let month: u32 = caps[2]
        .parse()
        .map_err(|_| InputError::DateFormat(input.to_string()))?;
    let year = match caps.get(3) {
        Some(y) => y
            .as_str()
            .parse()
            .map_err(|_| InputError::DateFormat(input.to_string()))?,
        None => current_year,
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| InputError::InvalidDate(input.to_string()))
}

/// Parse a strict 24-hour `HH:MM`.
pub fn parse_time(input: &str) -> Result<NaiveTime, InputError> {
    let input = input.trim();
    let caps = time_pattern()
        .captures(input)
        .ok_or_else(|| InputError::TimeFormat(input.to_string()))?;

    let hour: u32 = caps[1]
        .parse()
        .map_err(|_| InputError::TimeFormat(input.to_string()))?;
    let minute: u32 = caps[2]
        .parse()
        .map_err(|_| InputError::TimeFormat(input.to_string()))?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| InputError::TimeFormat(input.to_string()))
}

/// Display form `DD.MM.YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{:04}", date.day(), date.month(), date.year())
}

/// Display form `HH:MM`.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
