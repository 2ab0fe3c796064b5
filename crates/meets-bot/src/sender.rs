//! Reply delivery over the Telegram Bot API.

use async_trait::async_trait;
use meets_dialog::{DialogError, Keyboard, Reply, ReplySender};
use telegram_bot_api::{InlineKeyboardButton, InlineKeyboardMarkup, SendMessageParams, TelegramClient};
use tracing::debug;

/// Sends replies as HTML messages with inline keyboards.
#[derive(Clone)]
pub struct TelegramSender {
    client: TelegramClient,
}

impl TelegramSender {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReplySender for TelegramSender {
    async fn send(&self, reply: &Reply) -> Result<(), DialogError> {
        let message = self
            .client
            .send_message(&send_params(reply))
            .await
            .map_err(|e| DialogError::SendFailed(e.to_string()))?;
        debug!("Sent message {} to chat {}", message.message_id, message.chat.id);
        Ok(())
    }
}

/// sendMessage parameters for a reply.
pub fn send_params(reply: &Reply) -> SendMessageParams {
    let params = SendMessageParams::html(reply.conversation.chat_id, reply.text.clone())
        .with_thread(reply.conversation.thread_id.filter(|id| *id > 0));

    match &reply.keyboard {
        Some(keyboard) => params.with_keyboard(inline_keyboard(keyboard)),
        None => params,
    }
}

fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.payload()))
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meets_dialog::{render, Conversation, Prompt};

    #[test]
    fn test_plain_reply() {
        let reply = Reply::new(Conversation::new(42, None), Prompt::text("<b>hi</b>"));
        let params = send_params(&reply);
        assert_eq!(params.chat_id, 42);
        assert_eq!(params.text, "<b>hi</b>");
        assert_eq!(params.message_thread_id, None);
        assert_eq!(params.parse_mode.as_deref(), Some("HTML"));
        assert!(params.reply_markup.is_none());
    }

    #[test]
    fn test_keyboard_rows_and_payloads() {
        let reply = Reply::new(
            Conversation::new(-100500, Some(7)),
            Prompt::with_keyboard("card", render::post_meeting_keyboard("abc123")),
        );
        let params = send_params(&reply);
        assert_eq!(params.message_thread_id, Some(7));

        let markup = params.reply_markup.unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].callback_data, "meet:edit:abc123");
        assert_eq!(markup.inline_keyboard[1][1].callback_data, "meet:delete:abc123");
    }

    #[test]
    fn test_non_positive_thread_dropped() {
        let reply = Reply::new(Conversation::new(1, Some(0)), Prompt::text("x"));
        assert_eq!(send_params(&reply).message_thread_id, None);
    }
}
