//! Prompt text and keyboard layouts.
//!
//! Every function here is a pure mapping from dialog data to a [`Prompt`];
//! text is Telegram HTML, so user-provided values go through [`escape_html`].

use chrono::{Duration, NaiveDate, NaiveTime};
use meeting_core::{format_date, format_time, LedgerRow, ManagerEntry};

use crate::command::{BackTarget, Command, ConfirmAction, DateChoice, EditField, TimeChoice};
use crate::session::MeetingDraft;

/// Times offered in the time menu.
pub const PRESET_TIMES: [(u32, u32); 5] = [(10, 0), (11, 0), (12, 0), (15, 0), (16, 0)];

/// Where a reply goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversation {
    pub chat_id: i64,
    /// Forum topic, if any.
    pub thread_id: Option<i64>,
}

impl Conversation {
    pub fn new(chat_id: i64, thread_id: Option<i64>) -> Self {
        Self { chat_id, thread_id }
    }
}

/// An inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub command: Command,
}

impl Button {
    pub fn new(label: impl Into<String>, command: Command) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }

    /// Callback payload for this button.
    pub fn payload(&self) -> String {
        self.command.payload()
    }
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.rows.push(buttons);
        }
        self
    }

    /// All buttons, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Whether any button carries `command`.
    pub fn contains(&self, command: &Command) -> bool {
        self.buttons().any(|b| &b.command == command)
    }
}

/// Text plus optional keyboard, before a destination is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// A message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub conversation: Conversation,
}

impl Reply {
    pub fn new(conversation: Conversation, prompt: Prompt) -> Self {
        Self {
            text: prompt.text,
            keyboard: prompt.keyboard,
            conversation,
        }
    }
}

/// Escape text for Telegram HTML.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn cancel_button() -> Button {
    Button::new("✖️ Cancel", Command::Cancel)
}

fn back_button(target: BackTarget) -> Button {
    Button::new("◀️ Back", Command::Back(target))
}

fn with_error(error: Option<&str>, text: &str) -> String {
    match error {
        Some(error) => format!("⚠️ {}\n\n{}", escape_html(error), text),
        None => text.to_string(),
    }
}

pub fn ask_client(draft: &MeetingDraft) -> Prompt {
    let mut text = "🧑 <b>New meeting</b>\n\nSend the client name.".to_string();
    if let Some(client) = &draft.client {
        text.push_str(&format!("\nCurrent: <b>{}</b>", escape_html(client)));
    }
    Prompt::with_keyboard(text, Keyboard::new().row(vec![cancel_button()]))
}

pub fn empty_client() -> Prompt {
    Prompt::with_keyboard(
        "⚠️ The client name cannot be empty. Send the client name.",
        Keyboard::new().row(vec![cancel_button()]),
    )
}

pub fn ask_date(today: NaiveDate) -> Prompt {
    let tomorrow = today + Duration::days(1);
    let keyboard = Keyboard::new()
        .row(vec![
            Button::new(
                format!("Today ({})", short_date(today)),
                Command::Date(DateChoice::Today),
            ),
            Button::new(
                format!("Tomorrow ({})", short_date(tomorrow)),
                Command::Date(DateChoice::Tomorrow),
            ),
        ])
        .row(vec![Button::new("📅 Other date…", Command::Date(DateChoice::Custom))])
        .row(vec![back_button(BackTarget::Client), cancel_button()]);
    Prompt::with_keyboard("📅 Choose the date:", keyboard)
}

pub fn ask_custom_date(error: Option<&str>) -> Prompt {
    let text = with_error(error, "📅 Send the date as <b>DD.MM</b> or <b>DD.MM.YYYY</b>.");
    Prompt::with_keyboard(
        text,
        Keyboard::new().row(vec![back_button(BackTarget::Date), cancel_button()]),
    )
}

pub fn ask_time() -> Prompt {
    let mut presets: Vec<Button> = PRESET_TIMES
        .iter()
        .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
        .map(|t| Button::new(format_time(t), Command::Time(TimeChoice::Preset(t))))
        .collect();
    presets.push(Button::new("⏰ Other…", Command::Time(TimeChoice::Custom)));

    let mut keyboard = Keyboard::new();
    for chunk in presets.chunks(3) {
        keyboard = keyboard.row(chunk.to_vec());
    }
    keyboard = keyboard.row(vec![back_button(BackTarget::Date), cancel_button()]);

    Prompt::with_keyboard("⏰ Choose the time:", keyboard)
}

pub fn ask_custom_time(error: Option<&str>) -> Prompt {
    let text = with_error(error, "⏰ Send the time as <b>HH:MM</b> (24-hour).");
    Prompt::with_keyboard(
        text,
        Keyboard::new().row(vec![back_button(BackTarget::Time), cancel_button()]),
    )
}

pub fn ask_manager(managers: &[ManagerEntry]) -> Prompt {
    let buttons: Vec<Button> = managers
        .iter()
        .map(|m| {
            let choice = m.to_choice();
            Button::new(choice.pretty().to_string(), Command::Manager(choice))
        })
        .collect();

    let mut keyboard = Keyboard::new();
    for pair in buttons.chunks(2) {
        keyboard = keyboard.row(pair.to_vec());
    }
    keyboard = keyboard
        .row(vec![back_button(BackTarget::Time)])
        .row(vec![cancel_button()]);

    Prompt::with_keyboard("👤 Choose the manager:", keyboard)
}

pub fn managers_unavailable(reason: &str) -> Prompt {
    Prompt::with_keyboard(
        format!(
            "⚠️ Could not load the manager list:\n<code>{}</code>",
            escape_html(reason)
        ),
        Keyboard::new()
            .row(vec![back_button(BackTarget::Time)])
            .row(vec![cancel_button()]),
    )
}

pub fn no_managers() -> Prompt {
    Prompt::with_keyboard(
        "⚠️ The manager list is empty. Add managers to the sheet and try again.",
        Keyboard::new()
            .row(vec![back_button(BackTarget::Time)])
            .row(vec![cancel_button()]),
    )
}

pub fn ask_comment() -> Prompt {
    Prompt::with_keyboard(
        "💬 Send a comment for the meeting or press Skip.",
        Keyboard::new()
            .row(vec![Button::new("⏭ Skip", Command::SkipComment)])
            .row(vec![back_button(BackTarget::Manager), cancel_button()]),
    )
}

fn draft_lines(draft: &MeetingDraft) -> String {
    let client = draft.client.as_deref().unwrap_or("—");
    let date = draft.date.map(format_date).unwrap_or_else(|| "—".to_string());
    let time = draft.time.map(format_time).unwrap_or_else(|| "—".to_string());
    let manager = draft.manager.as_ref().map(|m| m.pretty()).unwrap_or("—");
    let comment = match draft.comment.as_deref() {
        Some(c) if !c.is_empty() => c,
        _ => "—",
    };

    format!(
        "🧑 Client: <b>{}</b>\n📅 Date: <b>{}</b>\n⏰ Time: <b>{}</b>\n👤 Manager: <b>{}</b>\n💬 Comment: {}",
        escape_html(client),
        date,
        time,
        escape_html(manager),
        escape_html(comment),
    )
}

pub fn confirm(draft: &MeetingDraft, error: Option<&str>) -> Prompt {
    let text = with_error(
        error,
        &format!("📝 <b>Check the meeting</b>\n\n{}", draft_lines(draft)),
    );
    Prompt::with_keyboard(
        text,
        Keyboard::new()
            .row(vec![Button::new("✅ Create", Command::Confirm(ConfirmAction::Create))])
            .row(vec![Button::new("✏️ Change", Command::Confirm(ConfirmAction::Edit))])
            .row(vec![cancel_button()]),
    )
}

/// Hint for free text sent while the current step expects a button.
pub fn use_buttons() -> Prompt {
    Prompt::text("👆 Use the buttons above, or press Cancel.")
}

pub fn cancelled() -> Prompt {
    Prompt::text("❌ Cancelled.")
}

pub fn post_meeting_keyboard(event_id: &str) -> Keyboard {
    Keyboard::new()
        .row(vec![Button::new("➕ Create another", Command::Start)])
        .row(vec![
            Button::new("✏️ Edit", Command::Edit(event_id.to_string())),
            Button::new("🗑 Delete", Command::Delete(event_id.to_string())),
        ])
}

pub fn created(draft: &MeetingDraft, event_id: &str) -> Prompt {
    Prompt::with_keyboard(
        format!(
            "✅ <b>Meeting created</b>\n\n{}\n🆔 <code>{}</code>",
            draft_lines(draft),
            escape_html(event_id)
        ),
        post_meeting_keyboard(event_id),
    )
}

pub fn create_failed(reason: &str) -> Prompt {
    Prompt::with_keyboard(
        format!(
            "❌ Could not create the meeting in the calendar:\n<code>{}</code>\n\nPress Create to try again.",
            escape_html(reason)
        ),
        Keyboard::new()
            .row(vec![Button::new("✅ Create", Command::Confirm(ConfirmAction::Create))])
            .row(vec![cancel_button()]),
    )
}

/// Calendar write succeeded but the ledger mirror did not.
pub fn ledger_warning(reason: &str) -> Prompt {
    Prompt::text(format!(
        "⚠️ The calendar is up to date, but the spreadsheet was not updated:\n<code>{}</code>",
        escape_html(reason)
    ))
}

pub fn edit_menu(row: &LedgerRow) -> Prompt {
    let comment = if row.comment.is_empty() { "—" } else { &row.comment };
    let text = format!(
        "✏️ <b>Edit meeting</b>\n\n🧑 Client: <b>{}</b>\n📅 Date: <b>{}</b>\n⏰ Time: <b>{}</b>\n💬 Comment: {}\n🆔 <code>{}</code>\n\nWhat should change?",
        escape_html(&row.client),
        escape_html(&row.date),
        escape_html(&row.time),
        escape_html(comment),
        escape_html(&row.event_id),
    );
    Prompt::with_keyboard(
        text,
        Keyboard::new()
            .row(vec![
                Button::new("📅 Date", Command::EditField(EditField::Date)),
                Button::new("⏰ Time", Command::EditField(EditField::Time)),
            ])
            .row(vec![
                Button::new("🧑 Client", Command::EditField(EditField::Client)),
                Button::new("💬 Comment", Command::EditField(EditField::Comment)),
            ])
            .row(vec![cancel_button()]),
    )
}

pub fn ask_edit_field(field: EditField, error: Option<&str>) -> Prompt {
    let question = match field {
        EditField::Date => "📅 Send the new date as <b>DD.MM</b> or <b>DD.MM.YYYY</b>.",
        EditField::Time => "⏰ Send the new time as <b>HH:MM</b> (24-hour).",
        EditField::Client => "🧑 Send the new client name.",
        EditField::Comment => "💬 Send the new comment, or <b>-</b> to remove it.",
    };
    Prompt::with_keyboard(
        with_error(error, question),
        Keyboard::new().row(vec![cancel_button()]),
    )
}

pub fn edit_target_missing(event_id: &str) -> Prompt {
    Prompt::text(format!(
        "⚠️ Meeting <code>{}</code> was not found. It may have been deleted.",
        escape_html(event_id)
    ))
}

pub fn ledger_read_failed(reason: &str) -> Prompt {
    Prompt::text(format!(
        "⚠️ Could not read the meeting from the spreadsheet:\n<code>{}</code>",
        escape_html(reason)
    ))
}

pub fn update_failed(reason: &str) -> Prompt {
    Prompt::with_keyboard(
        format!(
            "❌ Could not update the meeting in the calendar:\n<code>{}</code>\n\nSend the value again to retry.",
            escape_html(reason)
        ),
        Keyboard::new().row(vec![cancel_button()]),
    )
}

pub fn updated(row: &LedgerRow) -> Prompt {
    let comment = if row.comment.is_empty() { "—" } else { &row.comment };
    Prompt::with_keyboard(
        format!(
            "✅ <b>Meeting updated</b>\n\n🧑 Client: <b>{}</b>\n📅 Date: <b>{}</b>\n⏰ Time: <b>{}</b>\n💬 Comment: {}",
            escape_html(&row.client),
            escape_html(&row.date),
            escape_html(&row.time),
            escape_html(comment),
        ),
        post_meeting_keyboard(&row.event_id),
    )
}

pub fn edit_session_expired() -> Prompt {
    Prompt::text("⚠️ This edit has expired. Open the meeting card and press Edit again.")
}

pub fn delete_failed(reason: &str) -> Prompt {
    Prompt::text(format!(
        "❌ Could not delete the meeting from the calendar:\n<code>{}</code>",
        escape_html(reason)
    ))
}

pub fn deleted(event_id: &str) -> Prompt {
    Prompt::with_keyboard(
        format!("🗑 Meeting <code>{}</code> deleted.", escape_html(event_id)),
        Keyboard::new().row(vec![
            Button::new("➕ Create new", Command::Start),
            Button::new("✏️ Edit", Command::DeletedNotice),
            Button::new("🗑 Delete", Command::DeletedNotice),
        ]),
    )
}

pub fn already_deleted() -> Prompt {
    Prompt::text("ℹ️ This meeting was already deleted. Press «Create new» to schedule another.")
}

/// Reply for text from an account that cannot be tied to a person.
pub fn anonymous_sender() -> Prompt {
    Prompt::text(
        "⚠️ I can't tell who you are. Turn off «Remain anonymous» in your admin settings, \
         or reply to one of my messages.",
    )
}

pub fn started() -> Prompt {
    Prompt::with_keyboard(
        "🤖 Meetings bot started.",
        Keyboard::new().row(vec![Button::new("➕ Create meeting", Command::Start)]),
    )
}

fn short_date(date: NaiveDate) -> String {
    date.format("%d.%m").to_string()
}
