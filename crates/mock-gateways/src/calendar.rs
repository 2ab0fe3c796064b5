//! In-memory calendar.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use meeting_core::{
    CalendarEvent, CalendarGateway, EventPatch, EventTime, GatewayError, NewEvent, Result,
};

use crate::failures::{Failures, Operation};
use crate::log::CallLog;

/// Calendar keeping events in a map.
///
/// `list_day` interprets days in the zone given at construction.
#[derive(Debug)]
pub struct InMemoryCalendar {
    tz: Tz,
    events: Mutex<HashMap<String, CalendarEvent>>,
    next_id: AtomicU64,
    failures: Failures,
    lose_create_response: Mutex<bool>,
    log: CallLog,
}

impl InMemoryCalendar {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            events: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            failures: Failures::default(),
            lose_create_response: Mutex::new(false),
            log: CallLog::new(),
        }
    }

    /// Record calls into a shared log.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Insert an event directly, bypassing the log.
    pub fn insert(&self, event: CalendarEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.insert(event.id.clone(), event);
        }
    }

    /// Snapshot of one event.
    pub fn event(&self, event_id: &str) -> Option<CalendarEvent> {
        self.events.lock().ok()?.get(event_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fail_next(&self, operation: Operation) {
        self.failures.fail_next(operation);
    }

    pub fn fail_always(&self, operation: Operation) {
        self.failures.fail_always(operation);
    }

    pub fn heal(&self, operation: Operation) {
        self.failures.heal(operation);
    }

    /// Make the next create store the event but still report a network error,
    /// as when a response is lost after the backend committed.
    pub fn lose_next_create_response(&self) {
        if let Ok(mut flag) = self.lose_create_response.lock() {
            *flag = true;
        }
    }

    fn take_lost_response(&self) -> bool {
        self.lose_create_response
            .lock()
            .map(|mut flag| std::mem::replace(&mut *flag, false))
            .unwrap_or(false)
    }

    fn local_date(&self, time: &EventTime) -> NaiveDate {
        match time {
            EventTime::At(dt) => dt.with_timezone(&self.tz).date_naive(),
            EventTime::AllDay(date) => *date,
        }
    }

    fn events(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CalendarEvent>>> {
        self.events
            .lock()
            .map_err(|_| GatewayError::Network("calendar state poisoned".to_string()))
    }
}

#[async_trait]
impl CalendarGateway for InMemoryCalendar {
    async fn create(&self, event: NewEvent) -> Result<String> {
        if let Err(err) = self.failures.check(Operation::CalendarCreate) {
            self.log.record(Operation::CalendarCreate, event.id.as_deref(), false);
            return Err(err);
        }

        let id = match event.id {
            Some(id) => id,
            None => format!("evt{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
        };

        let mut events = self.events()?;
        if events.contains_key(&id) {
            self.log.record(Operation::CalendarCreate, Some(&id), false);
            return Err(GatewayError::AlreadyExists { entity: "event", id });
        }

        events.insert(
            id.clone(),
            CalendarEvent {
                id: id.clone(),
                title: event.title,
                start: Some(EventTime::At(event.start)),
                end: Some(EventTime::At(event.end)),
                description: event.description,
                status: "confirmed".to_string(),
            },
        );
        drop(events);

        if self.take_lost_response() {
            self.log.record(Operation::CalendarCreate, Some(&id), false);
            return Err(GatewayError::Network("response lost".to_string()));
        }

        self.log.record(Operation::CalendarCreate, Some(&id), true);
        Ok(id)
    }

    async fn get(&self, event_id: &str) -> Result<CalendarEvent> {
        self.failures.check(Operation::CalendarGet).inspect_err(|_| {
            self.log.record(Operation::CalendarGet, Some(event_id), false);
        })?;

        let found = self.events()?.get(event_id).cloned();
        self.log.record(Operation::CalendarGet, Some(event_id), found.is_some());
        found.ok_or_else(|| GatewayError::event_not_found(event_id))
    }

    async fn patch(&self, event_id: &str, patch: EventPatch) -> Result<()> {
        self.failures.check(Operation::CalendarPatch).inspect_err(|_| {
            self.log.record(Operation::CalendarPatch, Some(event_id), false);
        })?;

        let mut events = self.events()?;
        let Some(event) = events.get_mut(event_id) else {
            self.log.record(Operation::CalendarPatch, Some(event_id), false);
            return Err(GatewayError::event_not_found(event_id));
        };

        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(start) = patch.start {
            event.start = Some(EventTime::At(start));
        }
        if let Some(end) = patch.end {
            event.end = Some(EventTime::At(end));
        }
        if let Some(description) = patch.description {
            event.description = description;
        }

        self.log.record(Operation::CalendarPatch, Some(event_id), true);
        Ok(())
    }

    async fn delete(&self, event_id: &str) -> Result<()> {
        self.failures.check(Operation::CalendarDelete).inspect_err(|_| {
            self.log.record(Operation::CalendarDelete, Some(event_id), false);
        })?;

        let removed = self.events()?.remove(event_id);
        self.log.record(Operation::CalendarDelete, Some(event_id), removed.is_some());
        removed
            .map(|_| ())
            .ok_or_else(|| GatewayError::event_not_found(event_id))
    }

    async fn list_day(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>> {
        self.failures.check(Operation::CalendarList).inspect_err(|_| {
            self.log.record(Operation::CalendarList, None, false);
        })?;

        let mut listed: Vec<CalendarEvent> = self
            .events()?
            .values()
            .filter(|e| e.start.map(|s| self.local_date(&s) == day).unwrap_or(false))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.start_key().cmp(&b.start_key()).then(a.id.cmp(&b.id)));

        self.log.record(Operation::CalendarList, None, true);
        Ok(listed)
    }
}
