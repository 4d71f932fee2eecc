//! Per-user session records and the store that holds them.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::routing::Language;

/// Telegram user identifier.
pub type UserId = u64;

/// Authentication state of a user. Only ever moves forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// No valid credential presented yet.
    #[default]
    Unauthenticated,
    /// A credential matched.
    Authenticated {
        /// Normalized credential that matched.
        credential_id: String,
        /// Name resolved from the credential.
        display_name: String,
    },
}

impl AuthState {
    /// Returns true once a credential has been accepted.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Everything the bot remembers about one user.
#[derive(Debug, Clone, Default)]
pub struct SessionRecord {
    /// Authentication state.
    pub auth: AuthState,

    /// Timestamps of recent messages, oldest first.
    pub window: VecDeque<DateTime<Utc>>,

    /// Set while the user is muted for flooding.
    pub muted_until: Option<DateTime<Utc>>,

    /// Reply language, fixed after the first message.
    pub language: Option<Language>,
}

/// Key-value store of session records.
///
/// Implementations must apply [`SessionStore::update`] atomically per key:
/// two updates for the same user never interleave, while updates for
/// different users may run concurrently.
pub trait SessionStore: Send + Sync {
    /// Returns a snapshot of a user's record.
    fn get(&self, user: UserId) -> Option<SessionRecord>;

    /// Replaces a user's record.
    fn put(&self, user: UserId, record: SessionRecord);

    /// Runs `f` against the user's record, creating a default one first if
    /// needed, while holding exclusive access to that key.
    fn update<R, F>(&self, user: UserId, f: F) -> R
    where
        F: FnOnce(&mut SessionRecord) -> R;

    /// Number of known users.
    fn len(&self) -> usize;

    /// Returns true if no user has been seen yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory session store. Sessions live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<UserId, SessionRecord>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, user: UserId) -> Option<SessionRecord> {
        self.sessions.get(&user).map(|entry| entry.value().clone())
    }

    fn put(&self, user: UserId, record: SessionRecord) {
        self.sessions.insert(user, record);
    }

    fn update<R, F>(&self, user: UserId, f: F) -> R
    where
        F: FnOnce(&mut SessionRecord) -> R,
    {
        // The entry guard holds the shard write lock until `f` returns.
        let mut entry = self.sessions.entry(user).or_default();
        f(entry.value_mut())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
