//! In-memory gateway implementations for testing.
//!
//! This crate provides fakes for the three external stores the dialog talks to:
//! - `InMemoryCalendar` - calendar events keyed by id
//! - `InMemoryLedger` - ledger rows in append order
//! - `StaticDirectory` - a fixed manager list
//!
//! All three can share a [`CallLog`] so tests can assert the order of calls
//! across stores, and each can be told to fail specific operations.
//!
//! # Example
//!
//! ```rust
//! use mock_gateways::{CallLog, InMemoryCalendar, InMemoryLedger, Operation};
//!
//! let log = CallLog::new();
//! let calendar = InMemoryCalendar::new(chrono_tz::Asia::Almaty).with_log(log.clone());
//! let ledger = InMemoryLedger::new().with_log(log.clone());
//!
//! // Make the next ledger append fail once
//! ledger.fail_next(Operation::LedgerAppend);
//! # let _ = calendar;
//! ```

mod calendar;
mod directory;
mod failures;
mod ledger;
mod log;

pub use calendar::InMemoryCalendar;
pub use directory::StaticDirectory;
pub use failures::{injected_failure, Failures, Operation};
pub use ledger::InMemoryLedger;
pub use log::{Call, CallLog};
