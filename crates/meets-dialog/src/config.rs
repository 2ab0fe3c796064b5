//! Configuration shared by the bot and the digest jobs.

use std::env;

use chrono_tz::Tz;

use crate::error::DialogError;
use crate::render::Conversation;

/// Default time zone for scheduling.
pub const DEFAULT_TIMEZONE: &str = "Asia/Almaty";

/// Where meetings are discussed and which zone they are scheduled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetsConfig {
    /// Forum chat the bot posts into.
    pub forum_chat_id: i64,
    /// Topic inside the forum chat; `None` posts to the general topic.
    pub meets_thread_id: Option<i64>,
    pub timezone: Tz,
}

impl MeetsConfig {
    pub fn new(forum_chat_id: i64) -> Self {
        Self {
            forum_chat_id,
            meets_thread_id: None,
            timezone: chrono_tz::Asia::Almaty,
        }
    }

    pub fn with_thread(mut self, thread_id: i64) -> Self {
        self.meets_thread_id = Some(thread_id);
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `TELEGRAM_FORUM_CHAT_ID` - chat id of the forum group
    ///
    /// Optional environment variables:
    /// - `TELEGRAM_MEETS_THREAD_ID` - topic id (ignored unless a positive integer)
    /// - `TZ` - IANA time zone (default: Asia/Almaty)
    pub fn from_env() -> Result<Self, DialogError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DialogError> {
        let forum_chat_id = lookup("TELEGRAM_FORUM_CHAT_ID")
            .ok_or_else(|| DialogError::Config("TELEGRAM_FORUM_CHAT_ID not set".to_string()))?
            .trim()
            .parse::<i64>()
            .map_err(|e| DialogError::Config(format!("TELEGRAM_FORUM_CHAT_ID: {}", e)))?;

        let meets_thread_id = lookup("TELEGRAM_MEETS_THREAD_ID")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0);

        let tz_name = lookup("TZ")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = tz_name
            .parse::<Tz>()
            .map_err(|e| DialogError::Config(format!("TZ {:?}: {}", tz_name, e)))?;

        Ok(Self {
            forum_chat_id,
            meets_thread_id,
            timezone,
        })
    }

    /// The meets topic as a reply destination.
    pub fn meets_conversation(&self) -> Conversation {
        Conversation::new(self.forum_chat_id, self.meets_thread_id)
    }
}
