//! One card per meeting for today's report.

use chrono::NaiveDate;
use chrono_tz::Tz;
use meeting_core::{format_date, CalendarEvent, ManagedMeeting};
use meets_dialog::render::escape_html;
use meets_dialog::{Button, Command, Keyboard, Prompt};

/// Build today's cards from the calendar listing.
///
/// Only active meetings created by the bot are shown, ordered by start. The
/// first card carries the day header; with nothing to show a single header
/// card without buttons is returned.
pub fn build_daily_cards(events: &[CalendarEvent], tz: Tz, today: NaiveDate) -> Vec<Prompt> {
    let header = format!(
        "☀️ <b>Meetings for today</b> — <code>{}</code>\n\n",
        format_date(today)
    );

    let mut meetings: Vec<ManagedMeeting> = events
        .iter()
        .filter(|e| !e.is_cancelled())
        .filter_map(ManagedMeeting::from_event)
        .collect();

    if meetings.is_empty() {
        return vec![Prompt::text(format!("{}No meetings today ✅", header))];
    }

    meetings.sort_by_key(|m| (m.start.is_some(), m.start));

    meetings
        .iter()
        .enumerate()
        .map(|(i, meeting)| {
            let mut text = card_text(meeting, tz);
            if i == 0 {
                text.insert_str(0, &header);
            }
            Prompt::with_keyboard(text, card_keyboard(&meeting.event_id))
        })
        .collect()
}

fn card_text(meeting: &ManagedMeeting, tz: Tz) -> String {
    let time = meeting
        .start
        .map(|s| s.with_timezone(&tz).format("%H:%M").to_string())
        .unwrap_or_else(|| "—".to_string());

    let mut text = format!(
        "📌 <b>{}</b> — {}",
        time,
        escape_html(&strip_title_prefix(&meeting.title))
    );

    let fields = &meeting.fields;
    if !fields.manager_name.trim().is_empty() {
        text.push_str(&format!("\n👤 {}", escape_html(fields.manager_name.trim())));
    }
    if !fields.comment.trim().is_empty() {
        text.push_str(&format!("\n📝 {}", escape_html(fields.comment.trim())));
    }
    text.push_str(&format!("\n🆔 <code>{}</code>", escape_html(&meeting.event_id)));
    text
}

fn card_keyboard(event_id: &str) -> Keyboard {
    Keyboard::new().row(vec![
        Button::new("✏️ Edit", Command::Edit(event_id.to_string())),
        Button::new("🗑 Delete", Command::Delete(event_id.to_string())),
    ])
}

/// Title without the leading `Meeting:` label.
fn strip_title_prefix(title: &str) -> String {
    let title = title.trim();
    match title.split_once(':') {
        Some((label, rest)) if label.trim().eq_ignore_ascii_case("meeting") => rest.trim().to_string(),
        _ if title.is_empty() => "Meeting".to_string(),
        _ => title.to_string(),
    }
}
