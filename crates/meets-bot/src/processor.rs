//! Update processor connecting the Telegram poller to the meeting dialog.

use std::sync::Arc;

use futures::StreamExt;
use meets_dialog::{deliver, render, MeetingDialog, MeetsConfig, Reply, ReplySender};
use telegram_bot_api::{TelegramClient, Update};
use tracing::{debug, info, warn};

use crate::routing::{classify, Inbound};

/// Result of processing a single update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// The dialog produced replies; `delivered` of them were sent.
    Responded { replies: usize, delivered: usize },
    /// The update was handled but produced nothing to send.
    Silent,
    /// The update was skipped (outside the meets topic, no text, ...).
    Skipped { reason: String },
}

/// Feed one unit of input to the dialog and collect its replies.
///
/// Text from an account that cannot be tied to a person gets a fixed
/// instruction; button presses without an identity are dropped.
pub async fn dispatch(dialog: &MeetingDialog, inbound: &Inbound) -> Vec<Reply> {
    match inbound {
        Inbound::Text {
            actor: Some(actor),
            text,
            conversation,
        } => dialog.on_text(actor, text, *conversation).await,
        Inbound::Text {
            actor: None,
            conversation,
            ..
        } => vec![Reply::new(*conversation, render::anonymous_sender())],
        Inbound::Button {
            actor: Some(actor),
            payload,
            conversation,
            ..
        } => dialog.on_button(actor, payload, *conversation).await,
        Inbound::Button { actor: None, payload, .. } => {
            debug!("Dropping button {:?} without a human sender", payload);
            Vec::new()
        }
    }
}

/// Receives updates and runs each through the dialog.
pub struct UpdateProcessor {
    client: TelegramClient,
    dialog: Arc<MeetingDialog>,
    sender: Arc<dyn ReplySender>,
    config: MeetsConfig,
}

impl UpdateProcessor {
    pub fn new(
        client: TelegramClient,
        dialog: Arc<MeetingDialog>,
        sender: Arc<dyn ReplySender>,
        config: MeetsConfig,
    ) -> Self {
        Self {
            client,
            dialog,
            sender,
            config,
        }
    }

    pub fn dialog(&self) -> &MeetingDialog {
        &self.dialog
    }

    /// Post the startup notice to the meets topic. Failures are logged.
    pub async fn announce_start(&self) -> bool {
        let reply = Reply::new(self.config.meets_conversation(), render::started());
        match self.sender.send(&reply).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to post startup notice: {}", e);
                false
            }
        }
    }

    /// Acknowledge a callback, then process the update.
    pub async fn handle(&self, update: &Update) -> ProcessResult {
        if let Some(callback) = &update.callback_query {
            if let Err(e) = self.client.answer_callback_query(&callback.id).await {
                warn!("Failed to answer callback {}: {}", callback.id, e);
            }
        }
        self.process_update(update).await
    }

    /// Route an update into the dialog and deliver the replies.
    pub async fn process_update(&self, update: &Update) -> ProcessResult {
        let inbound = match classify(update, &self.config) {
            Ok(inbound) => inbound,
            Err(reason) => return ProcessResult::Skipped { reason },
        };

        let replies = dispatch(&self.dialog, &inbound).await;
        if replies.is_empty() {
            return ProcessResult::Silent;
        }

        let delivered = deliver(self.sender.as_ref(), &replies).await;
        ProcessResult::Responded {
            replies: replies.len(),
            delivered,
        }
    }

    /// Poll and process updates until `shutdown_signal` completes.
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S)
    where
        S: std::future::Future<Output = ()> + Send,
    {
        info!("Starting update processor");

        let mut updates = Box::pin(telegram_bot_api::updates(self.client.clone()));
        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping update processor");
                    return;
                }

                next = updates.next() => {
                    let Some(update) = next else {
                        warn!("Update stream ended");
                        return;
                    };
                    match self.handle(&update).await {
                        ProcessResult::Responded { replies, delivered } if delivered < replies => {
                            warn!(
                                "Update {}: delivered {} of {} replies",
                                update.update_id, delivered, replies
                            );
                        }
                        ProcessResult::Responded { replies, .. } => {
                            debug!("Update {}: sent {} replies", update.update_id, replies);
                        }
                        ProcessResult::Silent => {
                            debug!("Update {}: nothing to send", update.update_id);
                        }
                        ProcessResult::Skipped { reason } => {
                            debug!("Skipped update {}: {}", update.update_id, reason);
                        }
                    }
                }
            }
        }
    }
}
