//! Managers a meeting can be assigned to.

use async_trait::async_trait;

use crate::error::Result;

/// One row of the manager directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerEntry {
    /// Telegram user id as written in the sheet (may be empty).
    pub telegram_id: String,
    pub name: String,
    /// Telegram handle, with or without the leading `@`.
    pub username: String,
}

impl ManagerEntry {
    pub fn new(
        telegram_id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            telegram_id: telegram_id.into(),
            name: name.into(),
            username: username.into(),
        }
    }

    /// Token identifying this manager in a button payload.
    pub fn token(&self) -> ManagerToken {
        let handle = self.username.trim();
        if handle.is_empty() {
            ManagerToken::Name(self.name.trim().to_string())
        } else if handle.starts_with('@') {
            ManagerToken::Handle(handle.to_string())
        } else {
            ManagerToken::Handle(format!("@{}", handle))
        }
    }

    /// Convert into a selection, defaulting a missing id to 0.
    pub fn to_choice(&self) -> ManagerChoice {
        ManagerChoice {
            token: self.token(),
            telegram_id: self.telegram_id.trim().parse().unwrap_or(0),
            name: self.name.trim().to_string(),
        }
    }
}

/// Handle-or-name identity of a manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerToken {
    /// Telegram handle including the `@`.
    Handle(String),
    /// Bare display name, used when the manager has no handle.
    Name(String),
}

impl ManagerToken {
    const NAME_PREFIX: &'static str = "NAME:";

    /// Parse the wire form (`@handle` or `NAME:<name>`).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(name) = raw.strip_prefix(Self::NAME_PREFIX) {
            return Some(Self::Name(name.trim().to_string()));
        }
        if raw.len() > 1 && raw.starts_with('@') {
            return Some(Self::Handle(raw.to_string()));
        }
        None
    }

    /// Wire form used inside button payloads.
    pub fn as_wire(&self) -> String {
        match self {
            Self::Handle(handle) => handle.clone(),
            Self::Name(name) => format!("{}{}", Self::NAME_PREFIX, name),
        }
    }

    /// Handle including `@`, if this is a handle token.
    pub fn handle(&self) -> Option<&str> {
        match self {
            Self::Handle(handle) => Some(handle),
            Self::Name(_) => None,
        }
    }
}

/// A manager picked in the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerChoice {
    pub token: ManagerToken,
    /// Telegram id, 0 when unknown.
    pub telegram_id: i64,
    pub name: String,
}

impl ManagerChoice {
    /// Label shown to users: the handle when there is one, else the name.
    pub fn pretty(&self) -> &str {
        match &self.token {
            ManagerToken::Handle(handle) => handle,
            ManagerToken::Name(_) => &self.name,
        }
    }
}

/// Source of the managers offered in the dialog.
#[async_trait]
pub trait ManagerDirectory: Send + Sync {
    /// List managers in directory order.
    async fn list(&self) -> Result<Vec<ManagerEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_prefers_handle() {
        let entry = ManagerEntry::new("5", "Ivan", "ivan_k");
        assert_eq!(entry.token(), ManagerToken::Handle("@ivan_k".to_string()));

        let entry = ManagerEntry::new("5", "Ivan", "@ivan_k");
        assert_eq!(entry.token().as_wire(), "@ivan_k");
    }

    #[test]
    fn test_token_falls_back_to_name() {
        let entry = ManagerEntry::new("5", "Ivan", "");
        let choice = entry.to_choice();
        assert_eq!(choice.token, ManagerToken::Name("Ivan".to_string()));
        assert_eq!(choice.token.as_wire(), "NAME:Ivan");
        assert_eq!(choice.pretty(), "Ivan");
        assert_eq!(choice.telegram_id, 5);
    }

    #[test]
    fn test_missing_id_is_zero() {
        let choice = ManagerEntry::new("", "Anna", "@anna").to_choice();
        assert_eq!(choice.telegram_id, 0);
        assert_eq!(choice.pretty(), "@anna");
    }

    #[test]
    fn test_parse_wire_tokens() {
        assert_eq!(
            ManagerToken::parse("NAME:Anna Petrova"),
            Some(ManagerToken::Name("Anna Petrova".to_string()))
        );
        assert_eq!(
            ManagerToken::parse("@anna"),
            Some(ManagerToken::Handle("@anna".to_string()))
        );
        assert_eq!(ManagerToken::parse("anna"), None);
        assert_eq!(ManagerToken::parse("@"), None);
    }
}
