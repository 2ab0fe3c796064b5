//! Scheduled reports posted to the meets topic.
//!
//! - [`daily_cards`] - one card per meeting created by the bot, each with
//!   Edit/Delete buttons
//! - [`morning_digest`] - a single message with every event of the day,
//!   grouped by manager
//!
//! Both read today's events in the configured zone; the `daily-cards` and
//! `morning-digest` binaries post the result through the Bot API.

mod cards;
mod digest;

use meeting_core::{CalendarGateway, Clock, Result};
use meets_dialog::Prompt;
use tracing::info;

pub use cards::build_daily_cards;
pub use digest::{build_morning_digest, Assignee};

/// Cards for today's meetings.
pub async fn daily_cards(calendar: &dyn CalendarGateway, clock: &dyn Clock) -> Result<Vec<Prompt>> {
    let today = clock.today();
    let events = calendar.list_day(today).await?;
    info!("Building daily cards from {} events on {}", events.len(), today);
    Ok(build_daily_cards(&events, clock.timezone(), today))
}

/// Digest of today's events.
pub async fn morning_digest(calendar: &dyn CalendarGateway, clock: &dyn Clock) -> Result<Prompt> {
    let today = clock.today();
    let events = calendar.list_day(today).await?;
    info!("Building morning digest from {} events on {}", events.len(), today);
    Ok(build_morning_digest(&events, clock.timezone()))
}
