//! Long-polling update stream.

use std::collections::VecDeque;
use std::time::Duration;

use futures::stream::{self, Stream};
use tracing::{debug, warn};

use crate::client::TelegramClient;
use crate::types::Update;

/// Pause after a failed getUpdates call.
pub const ERROR_PAUSE: Duration = Duration::from_secs(2);

struct PollState {
    client: TelegramClient,
    offset: Option<i64>,
    pending: VecDeque<Update>,
}

/// Endless stream of updates.
///
/// Each received update moves the offset past it, so it is confirmed to the
/// server on the next poll. Transport errors are logged and polling resumes
/// after [`ERROR_PAUSE`].
pub fn updates(client: TelegramClient) -> impl Stream<Item = Update> {
    let state = PollState {
        client,
        offset: None,
        pending: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(update) = state.pending.pop_front() {
                return Some((update, state));
            }

            match state.client.get_updates(state.offset).await {
                Ok(batch) => {
                    if !batch.is_empty() {
                        debug!("Received {} updates", batch.len());
                    }
                    state.offset = next_offset(state.offset, &batch);
                    state.pending.extend(batch);
                }
                Err(e) => {
                    warn!("getUpdates failed: {}", e);
                    tokio::time::sleep(ERROR_PAUSE).await;
                }
            }
        }
    })
}

/// Offset that confirms every update in `batch`.
pub fn next_offset(current: Option<i64>, batch: &[Update]) -> Option<i64> {
    batch
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map(|next| current.map_or(next, |c| c.max(next)))
        .or(current)
}
