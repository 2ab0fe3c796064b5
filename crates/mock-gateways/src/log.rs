//! Shared record of gateway calls.

use std::sync::{Arc, Mutex};

use crate::failures::Operation;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    /// Event id involved, when the call carries one.
    pub event_id: Option<String>,
    /// Whether the call succeeded.
    pub ok: bool,
}

/// Append-only call journal, cheap to clone and share between fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, operation: Operation, event_id: Option<&str>, ok: bool) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                operation,
                event_id: event_id.map(str::to_string),
                ok,
            });
        }
    }

    /// All calls so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Operations so far, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.calls().into_iter().map(|c| c.operation).collect()
    }

    /// Number of calls of one kind.
    pub fn count(&self, operation: Operation) -> usize {
        self.calls().iter().filter(|c| c.operation == operation).count()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}
