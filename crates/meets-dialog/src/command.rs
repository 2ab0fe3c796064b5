//! Button commands carried in callback payloads.
//!
//! Payloads are colon-delimited tokens under the `meet:` prefix, e.g.
//! `meet:date:today` or `meet:manager:@ivan|5|Ivan`. Parsing never fails loudly:
//! anything unrecognised is `None` and gets ignored by the dialog.

use chrono::NaiveTime;
use meeting_core::{format_time, parse_time, ManagerChoice, ManagerToken};

const PREFIX: &str = "meet";

/// Telegram rejects callback data longer than this.
pub const MAX_PAYLOAD_BYTES: usize = 64;

/// Date shortcuts offered in the date step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateChoice {
    Today,
    Tomorrow,
    Custom,
}

/// Time menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeChoice {
    Preset(NaiveTime),
    Custom,
}

/// Create-flow step a back button returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    Client,
    Date,
    Time,
    Manager,
}

/// Field of an existing meeting that can be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Date,
    Time,
    Client,
    Comment,
}

impl EditField {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Client => "client",
            Self::Comment => "comment",
        }
    }
}

/// Answers on the confirmation card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Create,
    /// Go back to the first step keeping collected values.
    Edit,
}

/// A parsed button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new meeting.
    Start,
    Cancel,
    Date(DateChoice),
    Time(TimeChoice),
    Back(BackTarget),
    Manager(ManagerChoice),
    SkipComment,
    Confirm(ConfirmAction),
    /// Open the edit menu for an event.
    Edit(String),
    /// Delete an event.
    Delete(String),
    EditField(EditField),
    /// Button on the card of a meeting that was already deleted.
    DeletedNotice,
}

impl Command {
    /// Parse a callback payload.
    pub fn parse(payload: &str) -> Option<Self> {
        let rest = payload.trim().strip_prefix(PREFIX)?.strip_prefix(':')?;
        let (head, arg) = match rest.split_once(':') {
            Some((head, arg)) => (head, Some(arg)),
            None => (rest, None),
        };

        let command = match (head, arg) {
            ("new", None) | ("create", None) => Self::Start,
            ("cancel", None) => Self::Cancel,
            ("date", Some("today")) => Self::Date(DateChoice::Today),
            ("date", Some("tomorrow")) => Self::Date(DateChoice::Tomorrow),
            ("date", Some("custom")) => Self::Date(DateChoice::Custom),
            ("time", Some("custom")) => Self::Time(TimeChoice::Custom),
            ("time", Some(value)) => Self::Time(TimeChoice::Preset(parse_time(value).ok()?)),
            ("back", Some(target)) => Self::Back(match target {
                "client" => BackTarget::Client,
                "date" => BackTarget::Date,
                "time" => BackTarget::Time,
                "manager" => BackTarget::Manager,
                _ => return None,
            }),
            ("manager", Some(value)) => Self::Manager(parse_manager(value)?),
            ("comment", Some("skip")) => Self::SkipComment,
            ("confirm", Some("create")) => Self::Confirm(ConfirmAction::Create),
            ("confirm", Some("edit")) => Self::Confirm(ConfirmAction::Edit),
            ("edit", Some(id)) => Self::Edit(non_empty(id)?),
            ("delete", Some(id)) => Self::Delete(non_empty(id)?),
            ("editfield", Some(field)) => Self::EditField(match field {
                "date" => EditField::Date,
                "time" => EditField::Time,
                "client" => EditField::Client,
                "comment" => EditField::Comment,
                _ => return None,
            }),
            ("deleted", Some("edit")) | ("deleted", Some("delete")) => Self::DeletedNotice,
            _ => return None,
        };

        Some(command)
    }

    /// Payload for a button carrying this command.
    pub fn payload(&self) -> String {
        let tail = match self {
            Self::Start => "create".to_string(),
            Self::Cancel => "cancel".to_string(),
            Self::Date(choice) => match choice {
                DateChoice::Today => "date:today",
                DateChoice::Tomorrow => "date:tomorrow",
                DateChoice::Custom => "date:custom",
            }
            .to_string(),
            Self::Time(TimeChoice::Preset(time)) => format!("time:{}", format_time(*time)),
            Self::Time(TimeChoice::Custom) => "time:custom".to_string(),
            Self::Back(target) => match target {
                BackTarget::Client => "back:client",
                BackTarget::Date => "back:date",
                BackTarget::Time => "back:time",
                BackTarget::Manager => "back:manager",
            }
            .to_string(),
            Self::Manager(choice) => manager_tail(choice),
            Self::SkipComment => "comment:skip".to_string(),
            Self::Confirm(ConfirmAction::Create) => "confirm:create".to_string(),
            Self::Confirm(ConfirmAction::Edit) => "confirm:edit".to_string(),
            Self::Edit(id) => format!("edit:{}", id),
            Self::Delete(id) => format!("delete:{}", id),
            Self::EditField(field) => format!("editfield:{}", field.as_str()),
            Self::DeletedNotice => "deleted:edit".to_string(),
        };
        format!("{}:{}", PREFIX, tail)
    }
}

/// `<token>|<id>|<name>`; the name may itself contain `|`.
fn parse_manager(value: &str) -> Option<ManagerChoice> {
    let mut parts = value.splitn(3, '|');
    let token = ManagerToken::parse(parts.next()?)?;
    let telegram_id = parts.next()?.trim().parse().unwrap_or(0);
    let name = match parts.next()?.trim() {
        // Cut from the payload to fit the size limit.
        "" => match &token {
            ManagerToken::Handle(handle) => handle.clone(),
            ManagerToken::Name(name) => name.clone(),
        },
        name => name.to_string(),
    };
    Some(ManagerChoice {
        token,
        telegram_id,
        name,
    })
}

/// `manager:<token>|<id>|<name>`, shortened to fit [`MAX_PAYLOAD_BYTES`].
/// A long name token is cut first, then the display name.
fn manager_tail(choice: &ManagerChoice) -> String {
    let budget = MAX_PAYLOAD_BYTES - PREFIX.len() - 1;
    let id = choice.telegram_id.to_string();
    let fixed = "manager:".len() + id.len() + 2;

    let token = match &choice.token {
        ManagerToken::Name(name) => {
            let marker = ManagerToken::Name(String::new()).as_wire().len();
            let room = budget.saturating_sub(fixed + marker);
            ManagerToken::Name(truncate_utf8(name, room).trim_end().to_string())
        }
        handle => handle.clone(),
    };
    let wire = token.as_wire();
    let name = truncate_utf8(&choice.name, budget.saturating_sub(fixed + wire.len())).trim_end();

    format!("manager:{}|{}|{}", wire, id, name)
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary.
fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Whether free text asks to start a new meeting.
pub fn is_start_trigger(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    let command = text.split_whitespace().next().unwrap_or("");
    let command = command.split('@').next().unwrap_or("");
    command == "/meet" || text == "create meeting" || text == "+ meeting" || text == "+meeting"
}
