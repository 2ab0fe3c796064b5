//! Structured block stored in a calendar event description.
//!
//! ```text
//! source: qeepe_meets
//! manager_id: 5
//! manager_name: Ivan
//! client: Acme
//! comment<<<
//! first line
//! second: line
//! >>>comment
//! ```
//!
//! Older events carry a single `comment: value` line instead of the block; both
//! forms decode to the same field.

use indexmap::IndexMap;

/// Marker identifying calendar events owned by this bot.
pub const SOURCE_TAG: &str = "qeepe_meets";

const COMMENT_OPEN: &str = "comment<<<";
const COMMENT_CLOSE: &str = ">>>comment";

/// Fields encoded into an event description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionFields {
    /// Ownership marker; [`SOURCE_TAG`] for meetings created by the bot.
    pub source: String,
    /// Telegram id of the manager, 0 when unknown.
    pub manager_id: i64,
    pub manager_name: String,
    pub client: String,
    /// Free text, possibly multi-line. Empty means no comment.
    pub comment: String,
    /// Any other `key: value` lines, in the order they appeared.
    pub extra: IndexMap<String, String>,
}

impl DescriptionFields {
    /// Build fields for a new meeting, tagged with [`SOURCE_TAG`].
    pub fn new(
        manager_id: i64,
        manager_name: impl Into<String>,
        client: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            source: SOURCE_TAG.to_string(),
            manager_id,
            manager_name: manager_name.into(),
            client: client.into(),
            comment: comment.into(),
            extra: IndexMap::new(),
        }
    }

    /// Whether the description was written by this bot.
    pub fn is_ours(&self) -> bool {
        self.source == SOURCE_TAG
    }

    /// Render the line-oriented description text.
    pub fn encode(&self) -> String {
        let source = if self.source.is_empty() {
            SOURCE_TAG
        } else {
            self.source.as_str()
        };

        let mut lines = vec![
            format!("source: {}", single_line(source)),
            format!("manager_id: {}", self.manager_id),
            format!("manager_name: {}", single_line(&self.manager_name)),
            format!("client: {}", single_line(&self.client)),
        ];
        for (key, value) in &self.extra {
            lines.push(format!("{}: {}", key, single_line(value)));
        }

        let comment = normalize_newlines(&self.comment);
        if !comment.is_empty() {
            lines.push(COMMENT_OPEN.to_string());
            lines.extend(comment.split('\n').map(str::to_string));
            lines.push(COMMENT_CLOSE.to_string());
        }

        lines.join("\n")
    }

    /// Parse a description. Never fails; missing fields stay empty.
    pub fn decode(text: &str) -> Self {
        let text = normalize_newlines(text);
        let mut fields = Self::default();
        let mut block: Option<Vec<&str>> = None;

        for line in text.split('\n') {
            let trimmed = line.trim();

            if trimmed == COMMENT_OPEN {
                block = Some(Vec::new());
                continue;
            }
            if trimmed == COMMENT_CLOSE {
                if let Some(collected) = block.take() {
                    fields.comment = collected.join("\n");
                }
                continue;
            }
            if let Some(collected) = block.as_mut() {
                collected.push(line);
                continue;
            }

            if let Some(legacy) = trimmed.strip_prefix("comment:") {
                fields.comment = legacy.trim().to_string();
                continue;
            }

            let Some((key, value)) = split_key_value(trimmed) else {
                continue;
            };
            match key {
                "source" => fields.source = value.to_string(),
                "manager_id" => fields.manager_id = value.parse().unwrap_or(0),
                "manager_name" => fields.manager_name = value.to_string(),
                "client" => fields.client = value.to_string(),
                _ => {
                    fields.extra.insert(key.to_string(), value.to_string());
                }
            }
        }

        fields
    }
}

/// Split `key: value` when the key looks like an identifier.
///
/// Prose such as `Note: call first` outside the comment block still splits, but
/// `call at 10:00` does not, since `call at 10` is not a key.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    let is_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    is_key.then(|| (key, value.trim()))
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn single_line(value: &str) -> String {
    normalize_newlines(value).replace('\n', " ")
}
