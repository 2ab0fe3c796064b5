//! Failure injection shared by the fakes.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use meeting_core::GatewayError;

/// Gateway operations that can be recorded or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CalendarCreate,
    CalendarGet,
    CalendarPatch,
    CalendarDelete,
    CalendarList,
    LedgerAppend,
    LedgerFind,
    LedgerPatch,
    LedgerList,
    DirectoryList,
}

/// The error returned by an injected failure.
pub fn injected_failure(operation: Operation) -> GatewayError {
    GatewayError::Network(format!("injected failure: {:?}", operation))
}

/// Per-operation failure switches.
#[derive(Debug, Default)]
pub struct Failures {
    once: Mutex<HashMap<Operation, u32>>,
    always: Mutex<HashSet<Operation>>,
}

impl Failures {
    /// Fail the next call of `operation`.
    pub fn fail_next(&self, operation: Operation) {
        if let Ok(mut once) = self.once.lock() {
            *once.entry(operation).or_insert(0) += 1;
        }
    }

    /// Fail every call of `operation` until [`Failures::heal`].
    pub fn fail_always(&self, operation: Operation) {
        if let Ok(mut always) = self.always.lock() {
            always.insert(operation);
        }
    }

    /// Stop failing `operation`.
    pub fn heal(&self, operation: Operation) {
        if let Ok(mut always) = self.always.lock() {
            always.remove(&operation);
        }
        if let Ok(mut once) = self.once.lock() {
            once.remove(&operation);
        }
    }

    /// Consume a pending failure for `operation`, if any.
    pub fn check(&self, operation: Operation) -> Result<(), GatewayError> {
        if self
            .always
            .lock()
            .map(|always| always.contains(&operation))
            .unwrap_or(false)
        {
            return Err(injected_failure(operation));
        }

        if let Ok(mut once) = self.once.lock() {
            if let Some(remaining) = once.get_mut(&operation) {
                *remaining -= 1;
                if *remaining == 0 {
                    once.remove(&operation);
                }
                return Err(injected_failure(operation));
            }
        }

        Ok(())
    }
}
