//! Core types and traits for the meetings bot.
//!
//! A meeting lives in two places at once: a calendar event (the authoritative
//! copy) and a row in the spreadsheet ledger (a best-effort mirror). This crate
//! defines both shapes and the seams to the services holding them:
//!
//! - [`DescriptionFields`] - the structured block stored in an event description
//! - [`LedgerRow`] / [`LedgerPatch`] - the fixed-schema ledger row
//! - [`CalendarGateway`], [`LedgerGateway`], [`ManagerDirectory`] - external stores
//! - [`parse_date`] / [`parse_time`] - strict operator input parsing
//! - [`Clock`] - wall-clock access in the configured time zone
//!
//! # Example
//!
//! ```rust
//! use meeting_core::{DescriptionFields, SOURCE_TAG};
//!
//! let fields = DescriptionFields::new(5, "Ivan", "Acme", "bring the contract\nand a pen");
//! let text = fields.encode();
//! let decoded = DescriptionFields::decode(&text);
//!
//! assert_eq!(decoded.source, SOURCE_TAG);
//! assert_eq!(decoded.comment, "bring the contract\nand a pen");
//! ```

mod calendar;
mod clock;
mod description;
mod error;
mod input;
mod ledger;
mod listing;
mod manager;
mod meeting;

pub use calendar::{
    patch_meeting_event, CalendarEvent, CalendarGateway, DescriptionUpdate, EventPatch, EventTime,
    NewEvent,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use description::{DescriptionFields, SOURCE_TAG};
pub use error::{GatewayError, Result};
pub use input::{format_date, format_time, parse_date, parse_time, InputError};
pub use ledger::{LedgerGateway, LedgerPatch, LedgerRow, LEDGER_COLUMNS};
pub use listing::{list_meetings_for_date, ManagedMeeting};
pub use manager::{ManagerChoice, ManagerDirectory, ManagerEntry, ManagerToken};
pub use meeting::{meeting_title, MeetingSchedule, MeetingStatus, MEETING_DURATION_MINUTES};

// Re-export async_trait for gateway implementors
pub use async_trait::async_trait;
