//! Calendar-then-ledger writes.
//!
//! The calendar and the ledger are not transactional. Every mutation writes
//! the calendar first; the ledger only runs once the calendar committed, and a
//! ledger failure degrades the result instead of undoing the calendar change.

use std::future::Future;

use meeting_core::GatewayError;
use tracing::warn;

/// Result of a two-store write.
#[derive(Debug)]
pub enum WriteOutcome<T> {
    /// Both stores updated.
    Committed(T),
    /// Calendar updated, ledger mirror failed.
    Degraded(T, GatewayError),
    /// Calendar failed; the ledger was not touched.
    Aborted(GatewayError),
}

impl<T> WriteOutcome<T> {
    /// Whether the authoritative (calendar) write went through.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Aborted(_))
    }
}

/// Run `calendar`, then `ledger` with its output if it succeeded.
pub async fn calendar_then_ledger<T, C, L, F>(calendar: C, ledger: L) -> WriteOutcome<T>
where
    T: Clone,
    C: Future<Output = Result<T, GatewayError>>,
    L: FnOnce(T) -> F,
    F: Future<Output = Result<(), GatewayError>>,
{
    let committed = match calendar.await {
        Ok(value) => value,
        Err(err) => return WriteOutcome::Aborted(err),
    };

    match ledger(committed.clone()).await {
        Ok(()) => WriteOutcome::Committed(committed),
        Err(err) => {
            warn!("Calendar write committed but ledger write failed: {}", err);
            WriteOutcome::Degraded(committed, err)
        }
    }
}

/// Treat a patch that matched no row as a ledger failure.
pub(crate) fn require_row(found: bool, event_id: &str) -> Result<(), GatewayError> {
    if found {
        Ok(())
    } else {
        Err(GatewayError::NotFound {
            entity: "ledger row",
            id: event_id.to_string(),
        })
    }
}
