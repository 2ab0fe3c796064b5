//! In-memory ledger.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use meeting_core::{format_date, GatewayError, LedgerGateway, LedgerPatch, LedgerRow, Result};

use crate::failures::{Failures, Operation};
use crate::log::CallLog;

/// Ledger keeping rows in append order.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    rows: Mutex<Vec<LedgerRow>>,
    failures: Failures,
    log: CallLog,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls into a shared log.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Insert a row directly, bypassing the log.
    pub fn insert(&self, row: LedgerRow) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.push(row);
        }
    }

    /// Snapshot of all rows.
    pub fn rows(&self) -> Vec<LedgerRow> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Snapshot of the row for an event.
    pub fn row(&self, event_id: &str) -> Option<LedgerRow> {
        self.rows().into_iter().find(|r| r.event_id == event_id)
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

    fn guard(&self, operation: Operation, event_id: Option<&str>) -> Result<()> {
        self.failures
            .check(operation)
            .inspect_err(|_| self.log.record(operation, event_id, false))
    }

    fn rows_mut(&self) -> Result<std::sync::MutexGuard<'_, Vec<LedgerRow>>> {
        self.rows
            .lock()
            .map_err(|_| GatewayError::Network("ledger state poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn append(&self, row: &LedgerRow) -> Result<()> {
        self.guard(Operation::LedgerAppend, Some(&row.event_id))?;
        self.rows_mut()?.push(row.clone());
        self.log.record(Operation::LedgerAppend, Some(&row.event_id), true);
        Ok(())
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<LedgerRow>> {
        self.guard(Operation::LedgerFind, Some(event_id))?;
        let wanted = event_id.trim();
        let found = self
            .rows_mut()?
            .iter()
            .find(|r| r.event_id.trim() == wanted)
            .cloned();
        self.log.record(Operation::LedgerFind, Some(event_id), true);
        Ok(found)
    }

    async fn patch_by_event_id(&self, event_id: &str, patch: &LedgerPatch) -> Result<bool> {
        self.guard(Operation::LedgerPatch, Some(event_id))?;
        let wanted = event_id.trim();
        let mut rows = self.rows_mut()?;
        let found = match rows.iter_mut().find(|r| r.event_id.trim() == wanted) {
            Some(row) => {
                row.apply(patch);
                true
            }
            None => false,
        };
        drop(rows);
        self.log.record(Operation::LedgerPatch, Some(event_id), true);
        Ok(found)
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<LedgerRow>> {
        self.guard(Operation::LedgerList, None)?;
        let wanted = format_date(date);
        let mut rows: Vec<LedgerRow> = self
            .rows_mut()?
            .iter()
            .filter(|r| r.date.trim() == wanted)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.time.cmp(&b.time));
        self.log.record(Operation::LedgerList, None, true);
        Ok(rows)
    }
}
