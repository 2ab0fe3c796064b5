//! Meetings owned by the bot, as read back from the calendar.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::calendar::{CalendarEvent, CalendarGateway};
use crate::description::DescriptionFields;
use crate::error::Result;

/// A calendar event carrying this bot's description block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedMeeting {
    pub event_id: String,
    pub title: String,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub fields: DescriptionFields,
    pub cancelled: bool,
}

impl ManagedMeeting {
    /// Decode an event; `None` when the event was not created by this bot.
    pub fn from_event(event: &CalendarEvent) -> Option<Self> {
        let fields = DescriptionFields::decode(&event.description);
        if !fields.is_ours() {
            return None;
        }

        Some(Self {
            event_id: event.id.clone(),
            title: event.title.clone(),
            start: event.start.and_then(|t| t.instant()),
            end: event.end.and_then(|t| t.instant()),
            fields,
            cancelled: event.is_cancelled(),
        })
    }
}

/// Meetings created by this bot on `day`, in calendar order.
pub async fn list_meetings_for_date(
    calendar: &dyn CalendarGateway,
    day: NaiveDate,
) -> Result<Vec<ManagedMeeting>> {
    let events = calendar.list_day(day).await?;
    Ok(events.iter().filter_map(ManagedMeeting::from_event).collect())
}
