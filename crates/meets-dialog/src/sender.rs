//! Reply delivery trait and implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::DialogError;
use crate::render::Reply;

/// Trait for delivering replies.
///
/// Abstracted to support different transports (Telegram, tests, etc.)
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Deliver one reply.
    async fn send(&self, reply: &Reply) -> Result<(), DialogError>;
}

/// Send replies in order, logging failures. Returns how many were delivered.
pub async fn deliver(sender: &dyn ReplySender, replies: &[Reply]) -> usize {
    let mut delivered = 0;
    for reply in replies {
        match sender.send(reply).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Failed to deliver reply to chat {}: {}", reply.conversation.chat_id, e),
        }
    }
    delivered
}

/// A no-op sender for testing that discards all replies.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl ReplySender for NoOpSender {
    async fn send(&self, _reply: &Reply) -> Result<(), DialogError> {
        Ok(())
    }
}

/// A logging sender for dry runs that logs every reply.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl ReplySender for LoggingSender {
    async fn send(&self, reply: &Reply) -> Result<(), DialogError> {
        let buttons = reply.keyboard.as_ref().map(|k| k.buttons().count()).unwrap_or(0);
        info!(
            "[chat {} thread {:?}] {} ({} buttons)",
            reply.conversation.chat_id, reply.conversation.thread_id, reply.text, buttons
        );
        Ok(())
    }
}

/// A sender that keeps every reply, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Reply>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Reply> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReplySender for RecordingSender {
    async fn send(&self, reply: &Reply) -> Result<(), DialogError> {
        self.sent
            .lock()
            .map_err(|_| DialogError::SendFailed("recorder poisoned".to_string()))?
            .push(reply.clone());
        Ok(())
    }
}
