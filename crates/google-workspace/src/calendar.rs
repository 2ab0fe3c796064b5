//! Google Calendar API v3 gateway.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use meeting_core::{
    async_trait, CalendarEvent, CalendarGateway, EventPatch, EventTime, GatewayError, NewEvent,
    Result,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::GoogleClient;
use crate::config::GoogleConfig;

// ============================================================================
// API types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<EventResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResource {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

/// Body for insert and patch; absent fields are left out.
#[derive(Debug, Default, Serialize)]
struct EventBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<EventDateTime>,
}

impl EventDateTime {
    fn at(instant: DateTime<FixedOffset>, tz: Tz) -> Self {
        Self {
            date_time: Some(instant.to_rfc3339()),
            date: None,
            time_zone: Some(tz.name().to_string()),
        }
    }

    fn to_event_time(&self) -> Option<EventTime> {
        if let Some(dt) = self.date_time.as_deref() {
            return DateTime::parse_from_rfc3339(dt).ok().map(EventTime::At);
        }
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(EventTime::AllDay)
    }
}

impl From<EventResource> for CalendarEvent {
    fn from(raw: EventResource) -> Self {
        CalendarEvent {
            id: raw.id,
            title: raw.summary.unwrap_or_default(),
            start: raw.start.as_ref().and_then(EventDateTime::to_event_time),
            end: raw.end.as_ref().and_then(EventDateTime::to_event_time),
            description: raw.description.unwrap_or_default(),
            status: raw.status.unwrap_or_default(),
        }
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Calendar gateway backed by one Google calendar.
#[derive(Clone)]
pub struct GoogleCalendar {
    client: GoogleClient,
    base_url: String,
    calendar_id: String,
    tz: Tz,
}

impl GoogleCalendar {
    pub fn new(client: GoogleClient, config: &GoogleConfig) -> Self {
        Self {
            client,
            base_url: config.calendar_base_url.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            tz: config.timezone,
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendar {
    async fn create(&self, event: NewEvent) -> Result<String> {
        let requested = event.id.clone().unwrap_or_default();
        let body = EventBody {
            id: event.id,
            summary: Some(event.title),
            description: Some(event.description),
            start: Some(EventDateTime::at(event.start, self.tz)),
            end: Some(EventDateTime::at(event.end, self.tz)),
        };

        let created: EventResource = self
            .client
            .send_json(Method::POST, &self.events_url(), &[], &body)
            .await
            .map_err(|e| e.for_entity("event", &requested))?;

        info!("Created calendar event {}", created.id);
        Ok(created.id)
    }

    async fn get(&self, event_id: &str) -> Result<CalendarEvent> {
        let raw: EventResource = self
            .client
            .get_json(&self.event_url(event_id), &[])
            .await
            .map_err(|e| e.for_entity("event", event_id))?;
        Ok(raw.into())
    }

    async fn patch(&self, event_id: &str, patch: EventPatch) -> Result<()> {
        let body = EventBody {
            id: None,
            summary: patch.title,
            description: patch.description,
            start: patch.start.map(|s| EventDateTime::at(s, self.tz)),
            end: patch.end.map(|e| EventDateTime::at(e, self.tz)),
        };

        let _: EventResource = self
            .client
            .send_json(Method::PATCH, &self.event_url(event_id), &[], &body)
            .await
            .map_err(|e| e.for_entity("event", event_id))?;

        debug!("Patched calendar event {}", event_id);
        Ok(())
    }

    async fn delete(&self, event_id: &str) -> Result<()> {
        self.client
            .delete(&self.event_url(event_id))
            .await
            .map_err(|e| e.for_entity("event", event_id))?;
        info!("Deleted calendar event {}", event_id);
        Ok(())
    }

    async fn list_day(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let (time_min, time_max) = day_bounds(day, self.tz)?;
        let (time_min, time_max) = (time_min.to_rfc3339(), time_max.to_rfc3339());
        let url = self.events_url();

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", "250"),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: EventList = self.client.get_json(&url, &query).await?;
            events.extend(page.items.into_iter().map(CalendarEvent::from));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!("Listed {} events for {}", events.len(), day);
        Ok(events)
    }
}

/// Local midnight of `day` and of the following day, in `tz`.
fn day_bounds(day: NaiveDate, tz: Tz) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let next = day
        .succ_opt()
        .ok_or_else(|| GatewayError::InvalidResponse(format!("no day after {}", day)))?;
    Ok((start_of_day(day, tz)?, start_of_day(next, tz)?))
}

fn start_of_day(day: NaiveDate, tz: Tz) -> Result<DateTime<FixedOffset>> {
    // Zones that skip midnight start the day at the first valid hour.
    (0..3)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .find_map(|time| tz.from_local_datetime(&day.and_time(time)).earliest())
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| GatewayError::InvalidResponse(format!("no local midnight on {}", day)))
}
