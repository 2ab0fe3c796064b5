//! Calendar backend seam and meeting-aware patching.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::debug;

use crate::description::DescriptionFields;
use crate::error::Result;

/// Start or end of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    At(DateTime<FixedOffset>),
    AllDay(NaiveDate),
}

impl EventTime {
    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::At(dt) => Some(*dt),
            Self::AllDay(_) => None,
        }
    }
}

/// A calendar event as read back from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub description: String,
    /// Backend status, e.g. `confirmed` or `cancelled`.
    pub status: String,
}

impl CalendarEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status.eq_ignore_ascii_case("cancelled")
    }

    /// Sort key placing all-day events first, then by start instant.
    pub fn start_key(&self) -> (u8, Option<DateTime<FixedOffset>>) {
        match self.start {
            Some(EventTime::AllDay(_)) | None => (0, None),
            Some(EventTime::At(dt)) => (1, Some(dt)),
        }
    }
}

/// Request to create an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Client-assigned event id. Retrying with the same id cannot create a duplicate.
    pub id: Option<String>,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub description: String,
}

/// Partial event update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub description: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.start.is_none() && self.end.is_none() && self.description.is_none()
    }
}

/// Calendar holding the authoritative copy of each meeting.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Create an event and return its id.
    ///
    /// Fails with `AlreadyExists` when `event.id` is already taken.
    async fn create(&self, event: NewEvent) -> Result<String>;

    /// Fetch an event. Fails with `NotFound` if absent.
    async fn get(&self, event_id: &str) -> Result<CalendarEvent>;

    /// Apply a partial update. Fails with `NotFound` if absent.
    async fn patch(&self, event_id: &str, patch: EventPatch) -> Result<()>;

    /// Delete an event. Fails with `NotFound` if absent.
    async fn delete(&self, event_id: &str) -> Result<()>;

    /// Events on a local calendar day, ordered by start.
    async fn list_day(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>>;
}

/// Overrides for the structured description fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionUpdate {
    pub manager_id: Option<i64>,
    pub manager_name: Option<String>,
    pub client: Option<String>,
    pub comment: Option<String>,
}

impl DescriptionUpdate {
    pub fn is_empty(&self) -> bool {
        self.manager_id.is_none()
            && self.manager_name.is_none()
            && self.client.is_none()
            && self.comment.is_none()
    }

    fn apply(self, fields: &mut DescriptionFields) {
        if let Some(id) = self.manager_id {
            fields.manager_id = id;
        }
        if let Some(name) = self.manager_name {
            fields.manager_name = name;
        }
        if let Some(client) = self.client {
            fields.client = client;
        }
        if let Some(comment) = self.comment {
            fields.comment = comment;
        }
    }
}

/// Patch a meeting event, rebuilding its description from the stored one.
///
/// When `update` touches any structured field, the current description is
/// fetched, decoded, overridden and re-encoded, so fields not named in the
/// update (and unknown keys) survive. Does nothing when there is nothing to change.
pub async fn patch_meeting_event(
    calendar: &dyn CalendarGateway,
    event_id: &str,
    mut patch: EventPatch,
    update: DescriptionUpdate,
) -> Result<()> {
    if !update.is_empty() {
        let current = calendar.get(event_id).await?;
        let mut fields = DescriptionFields::decode(&current.description);
        update.apply(&mut fields);
        patch.description = Some(fields.encode());
    }

    if patch.is_empty() {
        debug!("Nothing to patch for event {}", event_id);
        return Ok(());
    }

    calendar.patch(event_id, patch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use std::sync::Mutex;

    /// Single-event calendar recording patches.
    struct OneEventCalendar {
        event: Mutex<Option<CalendarEvent>>,
        patches: Mutex<Vec<EventPatch>>,
    }

    impl OneEventCalendar {
        fn with_description(description: &str) -> Self {
            Self {
                event: Mutex::new(Some(CalendarEvent {
                    id: "evt1".to_string(),
                    title: "Meeting: Acme".to_string(),
                    start: None,
                    end: None,
                    description: description.to_string(),
                    status: "confirmed".to_string(),
                })),
                patches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CalendarGateway for OneEventCalendar {
        async fn create(&self, _event: NewEvent) -> Result<String> {
            unimplemented!()
        }

        async fn get(&self, event_id: &str) -> Result<CalendarEvent> {
            self.event
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| GatewayError::event_not_found(event_id))
        }

        async fn patch(&self, _event_id: &str, patch: EventPatch) -> Result<()> {
            self.patches.lock().unwrap().push(patch);
            Ok(())
        }

        async fn delete(&self, _event_id: &str) -> Result<()> {
            unimplemented!()
        }

        async fn list_day(&self, _day: NaiveDate) -> Result<Vec<CalendarEvent>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_patch_rebuilds_description() {
        let original = DescriptionFields::new(5, "Ivan", "Acme", "old note");
        let mut with_extra = original.clone();
        with_extra.extra.insert("room".to_string(), "4B".to_string());
        let calendar = OneEventCalendar::with_description(&with_extra.encode());

        let update = DescriptionUpdate {
            comment: Some("new note".to_string()),
            ..Default::default()
        };
        patch_meeting_event(&calendar, "evt1", EventPatch::default(), update)
            .await
            .unwrap();

        let patches = calendar.patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        let decoded = DescriptionFields::decode(patches[0].description.as_deref().unwrap());
        assert_eq!(decoded.comment, "new note");
        assert_eq!(decoded.client, "Acme");
        assert_eq!(decoded.manager_id, 5);
        assert_eq!(decoded.extra.get("room").map(String::as_str), Some("4B"));
        assert!(patches[0].title.is_none());
    }

    #[tokio::test]
    async fn test_empty_patch_is_noop() {
        let calendar = OneEventCalendar::with_description("");
        patch_meeting_event(&calendar, "evt1", EventPatch::default(), DescriptionUpdate::default())
            .await
            .unwrap();
        assert!(calendar.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_fails_when_event_missing() {
        let calendar = OneEventCalendar::with_description("");
        *calendar.event.lock().unwrap() = None;

        let update = DescriptionUpdate {
            client: Some("Beta".to_string()),
            ..Default::default()
        };
        let result = patch_meeting_event(&calendar, "evt1", EventPatch::default(), update).await;
        assert!(matches!(result, Err(GatewayError::NotFound { .. })));
        assert!(calendar.patches.lock().unwrap().is_empty());
    }
}
