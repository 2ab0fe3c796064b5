//! Conversation flow for scheduling meetings from a chat.
//!
//! This crate provides the [`MeetingDialog`] type which turns button presses
//! and free text into calendar and ledger writes, one user at a time.
//!
//! # Features
//!
//! - Step-by-step creation: client, date, time, manager, comment, confirm
//! - Editing a single field of an existing meeting
//! - Deleting a meeting, marking its ledger row canceled
//! - Calendar first, ledger second; ledger failures only produce a warning
//! - Retried confirms reuse the reserved event id, so no duplicate events
//!
//! # Architecture
//!
//! ```text
//! Telegram update (text or callback payload)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MEETING DIALOG                        │
//! │                                                             │
//! │  1. Take the per-user lock                                  │
//! │         ↓                                                   │
//! │  2. Parse payload (Command) / read session                  │
//! │         ↓                                                   │
//! │  3. Advance the step:                                       │
//! │     • prompt → store session, render next question          │
//! │     • confirm → calendar.create, then ledger.append         │
//! │     • edit field → calendar.patch, then ledger patch        │
//! │     • delete → calendar.delete, then ledger status=canceled │
//! │         ↓                                                   │
//! │  4. Return replies for the ReplySender                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meets_dialog::{deliver, Actor, Conversation, LoggingSender, MeetingDialog};
//!
//! let dialog = MeetingDialog::new(calendar, ledger, directory, clock);
//! let replies = dialog
//!     .on_text(&Actor::human(42), "/meet", Conversation::new(-100123, Some(7)))
//!     .await;
//! deliver(&LoggingSender, &replies).await;
//! ```

mod command;
mod config;
mod dialog;
mod error;
mod identity;
pub mod render;
mod saga;
mod sender;
mod session;

pub use command::{
    is_start_trigger, BackTarget, Command, ConfirmAction, DateChoice, EditField, TimeChoice,
    MAX_PAYLOAD_BYTES,
};
pub use config::{MeetsConfig, DEFAULT_TIMEZONE};
pub use dialog::MeetingDialog;
pub use error::DialogError;
pub use identity::{resolve_actor, Actor};
pub use render::{Button, Conversation, Keyboard, Prompt, Reply};
pub use saga::{calendar_then_ledger, WriteOutcome};
pub use sender::{deliver, LoggingSender, NoOpSender, RecordingSender, ReplySender};
pub use session::{
    CreateSession, CreateStep, EditSession, EditStep, InMemorySessionStore, MeetingDraft, Session,
    SessionStore, UserId, UserLocks,
};
