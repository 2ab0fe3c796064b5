//! Turning Telegram updates into dialog input.
//!
//! Private chats are always handled. In groups the bot only listens to the
//! meets topic, matched on the message's own topic or on the topic of the
//! message it replies to. Button presses are accepted from anywhere, since
//! the keyboards only exist where the bot posted them.

use meets_dialog::{resolve_actor, Actor, Conversation, MeetsConfig};
use telegram_bot_api::{CallbackQuery, Message, Update, User};

/// One unit of dialog input extracted from an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Free text typed by a user.
    Text {
        actor: Option<Actor>,
        text: String,
        conversation: Conversation,
    },
    /// An inline button press.
    Button {
        callback_id: String,
        actor: Option<Actor>,
        payload: String,
        conversation: Conversation,
    },
}

impl Inbound {
    /// Where replies to this input go.
    pub fn conversation(&self) -> Conversation {
        match self {
            Self::Text { conversation, .. } | Self::Button { conversation, .. } => *conversation,
        }
    }
}

/// Convert a Telegram user into a dialog actor.
pub fn actor_from_user(user: &User) -> Actor {
    Actor {
        id: user.id,
        username: user.username.clone().filter(|u| !u.is_empty()),
        is_bot: user.is_bot,
    }
}

/// Whether a message belongs to a conversation the bot serves.
pub fn is_routed(message: &Message, config: &MeetsConfig) -> bool {
    if message.chat.is_private() {
        return true;
    }

    let Some(thread_id) = config.meets_thread_id else {
        return true;
    };

    message.message_thread_id == Some(thread_id)
        || message
            .reply_to_message
            .as_ref()
            .is_some_and(|m| m.message_thread_id == Some(thread_id))
}

/// Extract the dialog input from an update, or the reason it is skipped.
pub fn classify(update: &Update, config: &MeetsConfig) -> Result<Inbound, String> {
    if let Some(callback) = &update.callback_query {
        return classify_callback(callback, config);
    }

    let message = update
        .any_message()
        .ok_or_else(|| "no message or callback".to_string())?;

    let text = message
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "no text".to_string())?;

    if !is_routed(message, config) {
        return Err(format!(
            "chat {} thread {:?} is outside the meets topic",
            message.chat.id,
            message.thread_id()
        ));
    }

    Ok(Inbound::Text {
        actor: message_actor(message),
        text: text.to_string(),
        conversation: Conversation::new(message.chat.id, message.thread_id()),
    })
}

fn classify_callback(callback: &CallbackQuery, config: &MeetsConfig) -> Result<Inbound, String> {
    let payload = callback
        .data
        .clone()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| "callback without data".to_string())?;

    let sender = actor_from_user(&callback.from);
    let replied = callback
        .message
        .as_ref()
        .and_then(|m| m.reply_to_message.as_ref())
        .and_then(|m| m.from.as_ref())
        .map(actor_from_user);

    let conversation = callback
        .message
        .as_ref()
        .map(|m| Conversation::new(m.chat.id, m.thread_id()))
        .unwrap_or_else(|| config.meets_conversation());

    Ok(Inbound::Button {
        callback_id: callback.id.clone(),
        actor: resolve_actor(Some(&sender), replied.as_ref()),
        payload,
        conversation,
    })
}

fn message_actor(message: &Message) -> Option<Actor> {
    let sender = message.from.as_ref().map(actor_from_user);
    let replied = message
        .reply_to_message
        .as_ref()
        .and_then(|m| m.from.as_ref())
        .map(actor_from_user);
    resolve_actor(sender.as_ref(), replied.as_ref())
}
