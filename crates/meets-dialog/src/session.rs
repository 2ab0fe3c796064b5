//! Per-user dialog sessions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use meeting_core::ManagerChoice;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::command::{BackTarget, EditField};

/// Telegram user id keying a session.
pub type UserId = i64;

/// Steps of the create flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    Client,
    Date,
    CustomDate,
    Time,
    CustomTime,
    Manager,
    Comment,
    Confirm,
}

impl From<BackTarget> for CreateStep {
    fn from(target: BackTarget) -> Self {
        match target {
            BackTarget::Client => Self::Client,
            BackTarget::Date => Self::Date,
            BackTarget::Time => Self::Time,
            BackTarget::Manager => Self::Manager,
        }
    }
}

/// Values collected so far in the create flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingDraft {
    pub client: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub manager: Option<ManagerChoice>,
    /// `Some("")` once the comment step was skipped.
    pub comment: Option<String>,
    /// Calendar id reserved by the first confirm, reused by retries.
    pub reserved_event_id: Option<String>,
}

/// Create-flow session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSession {
    pub step: CreateStep,
    pub draft: MeetingDraft,
}

impl CreateSession {
    pub fn new() -> Self {
        Self {
            step: CreateStep::Client,
            draft: MeetingDraft::default(),
        }
    }
}

impl Default for CreateSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Steps of the edit flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStep {
    Menu,
    Field(EditField),
}

/// Edit-flow session for one existing meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub event_id: String,
    pub step: EditStep,
}

/// In-progress dialog of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Create(CreateSession),
    Edit(EditSession),
}

impl Session {
    /// Event being edited, if this is an edit session.
    pub fn edited_event(&self) -> Option<&str> {
        match self {
            Self::Edit(edit) => Some(&edit.event_id),
            Self::Create(_) => None,
        }
    }
}

/// Storage for sessions keyed by user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: UserId) -> Option<Session>;
    async fn set(&self, user_id: UserId, session: Session);
    async fn clear(&self, user_id: UserId);
}

/// Process-local session map. Sessions do not survive a restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with an open session.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: UserId) -> Option<Session> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    async fn set(&self, user_id: UserId, session: Session) {
        self.sessions.write().await.insert(user_id, session);
    }

    async fn clear(&self, user_id: UserId) {
        self.sessions.write().await.remove(&user_id);
    }
}

/// Per-user mutual exclusion around session read-modify-write.
///
/// Handlers for the same user run one at a time; different users never wait
/// on each other beyond the brief registry lookup.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and hold the lock of `user_id`.
    ///
    /// Entries nobody holds or waits on are dropped on the way in, so the
    /// registry only tracks users with a handler in flight.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of users currently tracked.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = InMemorySessionStore::new();
        assert!(store.get(1).await.is_none());

        store.set(1, Session::Create(CreateSession::new())).await;
        assert_eq!(store.get(1).await, Some(Session::Create(CreateSession::new())));
        assert!(store.get(2).await.is_none());

        store.clear(1).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_session() {
        let store = InMemorySessionStore::new();
        store.set(7, Session::Create(CreateSession::new())).await;
        store
            .set(
                7,
                Session::Edit(EditSession {
                    event_id: "evt1".to_string(),
                    step: EditStep::Menu,
                }),
            )
            .await;

        let session = store.get(7).await.unwrap();
        assert_eq!(session.edited_event(), Some("evt1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_user_lock_serializes_same_user() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.acquire(1).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        // A different user is not blocked.
        let _other = locks.acquire(2).await;

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = UserLocks::new();
        for user_id in 1..=5 {
            let _guard = locks.acquire(user_id).await;
        }
        assert_eq!(locks.tracked().await, 1);

        let held = locks.acquire(10).await;
        let _next = locks.acquire(11).await;
        assert_eq!(locks.tracked().await, 2);

        drop(held);
        let _again = locks.acquire(12).await;
        assert_eq!(locks.tracked().await, 2);
    }
}
