//! Meeting record shared by the calendar and the ledger.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::input::InputError;

/// Fixed length of every meeting.
pub const MEETING_DURATION_MINUTES: i64 = 60;

/// Lifecycle status recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingStatus {
    Created,
    Updated,
    Canceled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "canceled" | "cancelled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start and end instants of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingSchedule {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl MeetingSchedule {
    /// Resolve a local date and time in `tz`.
    ///
    /// Ambiguous local times (DST fold) take the earlier instant; times that do
    /// not exist in the zone are rejected.
    pub fn at(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<Self, InputError> {
        let local = date.and_time(time);
        let start = tz
            .from_local_datetime(&local)
            .earliest()
            .ok_or(InputError::NonexistentLocalTime(local))?
            .fixed_offset();
        Ok(Self {
            start,
            end: start + Duration::minutes(MEETING_DURATION_MINUTES),
        })
    }
}

/// Calendar event title for a meeting.
pub fn meeting_title(client: &str, manager_label: &str) -> String {
    if manager_label.trim().is_empty() {
        format!("Meeting: {}", client)
    } else {
        format!("Meeting: {} — {}", client, manager_label)
    }
}
