//! Morning digest grouping today's meetings by manager.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono_tz::Tz;
use meeting_core::{CalendarEvent, DescriptionFields, EventTime};
use meets_dialog::render::escape_html;
use meets_dialog::{Button, Command, Keyboard, Prompt};
use regex::Regex;

const HEADER: &str = "📅 <b>Meetings for today:</b>";

fn handle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"@([a-zA-Z0-9_]{5,32})").expect("valid handle pattern"))
}

fn manager_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?im)^\s*manager\s*:\s*(.+?)\s*$").expect("valid manager line pattern")
    })
}

/// Who a meeting belongs to in the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignee {
    /// Telegram handle found in the title, including `@`.
    Handle(String),
    /// Manager name from the description.
    Name(String),
    Unassigned,
}

impl Assignee {
    /// Pick the assignee of an event: a handle in the title, else the
    /// structured manager name, else a free-form `Manager: Name` line.
    pub fn of(event: &CalendarEvent) -> Self {
        if let Some(caps) = handle_pattern().captures(&event.title) {
            return Self::Handle(format!("@{}", &caps[1]));
        }

        let fields = DescriptionFields::decode(&event.description);
        let name = fields.manager_name.trim();
        if !name.is_empty() {
            return Self::Name(name.to_string());
        }

        manager_line_pattern()
            .captures(&event.description)
            .map(|caps| caps[1].trim().to_string())
            .filter(|name| !name.is_empty())
            .map(Self::Name)
            .unwrap_or(Self::Unassigned)
    }

    /// Handles sort before names; both case-insensitively.
    fn sort_key(&self) -> Option<(u8, String, String)> {
        match self {
            Self::Handle(h) => Some((0, h.to_lowercase(), h.clone())),
            Self::Name(n) => Some((1, n.to_lowercase(), n.clone())),
            Self::Unassigned => None,
        }
    }
}

/// Build the digest message for today's events.
pub fn build_morning_digest(events: &[CalendarEvent], tz: Tz) -> Prompt {
    let mut active: Vec<&CalendarEvent> = events.iter().filter(|e| !e.is_cancelled()).collect();
    if active.is_empty() {
        return Prompt::text(format!("{}\n\n✅ No meetings today.", HEADER));
    }
    active.sort_by_key(|e| e.start_key());

    let mut groups: BTreeMap<(u8, String, String), Vec<String>> = BTreeMap::new();
    let mut unassigned = Vec::new();

    for event in active {
        let line = format!(
            "• <b>{}</b> — {}",
            start_label(event, tz),
            escape_html(event.title.trim())
        );
        match Assignee::of(event).sort_key() {
            Some(key) => groups.entry(key).or_default().push(line),
            None => unassigned.push(line),
        }
    }

    let mut lines = vec![format!("{}\n", HEADER)];
    for ((_, _, title), items) in groups {
        lines.push(format!("👤 <b>{}</b>", escape_html(&title)));
        lines.extend(items);
        lines.push(String::new());
    }
    if !unassigned.is_empty() {
        lines.push("⚠️ <b>Unassigned</b>".to_string());
        lines.extend(unassigned);
    }

    Prompt::with_keyboard(
        lines.join("\n").trim().to_string(),
        Keyboard::new().row(vec![Button::new("➕ Create meeting", Command::Start)]),
    )
}

fn start_label(event: &CalendarEvent, tz: Tz) -> String {
    match event.start {
        Some(EventTime::At(dt)) => dt.with_timezone(&tz).format("%H:%M").to_string(),
        Some(EventTime::AllDay(_)) => "All day".to_string(),
        None => "??:??".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str, description: &str) -> CalendarEvent {
        CalendarEvent {
            id: "e".to_string(),
            title: title.to_string(),
            start: None,
            end: None,
            description: description.to_string(),
            status: "confirmed".to_string(),
        }
    }

    #[test]
    fn test_handle_in_title_wins() {
        let fields = DescriptionFields::new(5, "Ivan", "Acme", "");
        let e = event("Meeting: Acme — @ivan_k", &fields.encode());
        assert_eq!(Assignee::of(&e), Assignee::Handle("@ivan_k".to_string()));
    }

    #[test]
    fn test_short_handle_ignored() {
        let e = event("Meeting: Acme — @ivk", "");
        assert_eq!(Assignee::of(&e), Assignee::Unassigned);
    }

    #[test]
    fn test_decoded_manager_name() {
        let fields = DescriptionFields::new(0, "Anna Petrova", "Acme", "");
        let e = event("Meeting: Acme — Anna Petrova", &fields.encode());
        assert_eq!(Assignee::of(&e), Assignee::Name("Anna Petrova".to_string()));
    }

    #[test]
    fn test_free_form_manager_line() {
        let e = event("Sync", "Agenda\n  MANAGER:  Oleg  \nRoom 4");
        assert_eq!(Assignee::of(&e), Assignee::Name("Oleg".to_string()));
    }

    #[test]
    fn test_nothing_to_group_by() {
        let e = event("Sync", "manager_name: \nnotes");
        assert_eq!(Assignee::of(&e), Assignee::Unassigned);
    }
}
