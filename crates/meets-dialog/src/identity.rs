//! Resolving the human behind an inbound event.
//!
//! In forum topics with anonymous admins, messages arrive from a service bot
//! account; the real author is then the sender of the message being replied to.

/// A chat participant as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    /// Handle without the leading `@`.
    pub username: Option<String>,
    pub is_bot: bool,
}

impl Actor {
    pub fn human(id: i64) -> Self {
        Self {
            id,
            username: None,
            is_bot: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    fn is_human(&self) -> bool {
        self.id != 0 && !self.is_bot
    }
}

/// Pick the acting human: the declared sender unless it is a bot, else the
/// sender of the replied-to message. `None` when neither is a human.
pub fn resolve_actor(sender: Option<&Actor>, replied_sender: Option<&Actor>) -> Option<Actor> {
    sender
        .filter(|a| a.is_human())
        .or_else(|| replied_sender.filter(|a| a.is_human()))
        .cloned()
}
