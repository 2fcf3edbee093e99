//! Conversation state and session storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::llm::Message;

/// Cap on stored turns: 10 user/assistant exchanges.
pub const MAX_HISTORY: usize = 20;

/// Default session idle timeout (30 minutes).
pub(crate) const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A single user session.
///
/// Holds the bounded conversation history and the last-selected region.
/// The system prompt is never stored here; it is regenerated per request.
#[derive(Debug)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Unique session identifier.
    id: String,
    /// Conversation history and region selection.
    state: RwLock<SessionData>,
    /// Session creation time.
    created_at: DateTime<Utc>,
    /// Last activity time, used for idle expiry.
    last_activity: RwLock<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct SessionData {
    history: Vec<Message>,
    selected_region: Option<String>,
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Session {
    fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(SessionInner {
                id,
                state: RwLock::new(SessionData::default()),
                created_at: now,
                last_activity: RwLock::new(now),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Get a copy of the conversation history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Message> {
        self.inner.state.read().unwrap().history.clone()
    }

    /// Append one user/assistant exchange, then evict the oldest entries
    /// beyond [`MAX_HISTORY`]. Eviction runs after the append, so the newest
    /// turn is always retained.
    pub fn record_exchange(&self, user_text: impl Into<String>, assistant_text: impl Into<String>) {
        let mut guard = self.inner.state.write().unwrap();
        guard.history.push(Message::user(user_text));
        guard.history.push(Message::assistant(assistant_text));
        let len = guard.history.len();
        if len > MAX_HISTORY {
            guard.history.drain(..len - MAX_HISTORY);
        }
        drop(guard);
        self.touch();
    }

    /// Drop all stored history. Returns whether any entries existed.
    pub fn clear_history(&self) -> bool {
        let mut guard = self.inner.state.write().unwrap();
        let had_entries = !guard.history.is_empty();
        guard.history.clear();
        drop(guard);
        self.touch();
        had_entries
    }

    /// Get the last-selected region, if any.
    #[must_use]
    pub fn selected_region(&self) -> Option<String> {
        self.inner.state.read().unwrap().selected_region.clone()
    }

    /// Overwrite the selected region. The client is authoritative here.
    pub fn set_selected_region(&self, region: impl Into<String>) {
        let mut guard = self.inner.state.write().unwrap();
        guard.selected_region = Some(region.into());
        drop(guard);
        self.touch();
    }

    /// Update the last activity timestamp.
    fn touch(&self) {
        let mut guard = self.inner.last_activity.write().unwrap();
        *guard = Utc::now();
    }

    /// Check if the session has been idle longer than the timeout.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self.inner.last_activity.read().unwrap();
        let now = Utc::now();
        if let Ok(duration) = (now - last).to_std() {
            duration > timeout
        } else {
            // Negative duration means clock skew or "last" is in future.
            false
        }
    }

    /// Get the session age.
    #[must_use]
    pub fn age(&self) -> Duration {
        let now = Utc::now();
        (now - self.inner.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }
}

/// Thread-safe store for sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a new session with a random ID and return it.
    #[must_use]
    pub fn create(&self) -> Session {
        let id = Uuid::new_v4().to_string();
        self.create_with_id(id)
    }

    /// Create a new session with a specific ID.
    #[must_use]
    pub fn create_with_id(&self, id: impl Into<String>) -> Session {
        let id = id.into();
        let session = Session::new(id.clone());
        let mut guard = self.inner.sessions.write().unwrap();
        guard.insert(id, session.clone());
        session
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        let guard = self.inner.sessions.read().unwrap();
        guard.get(id).cloned()
    }

    /// Get a session by ID, creating it if it doesn't exist.
    ///
    /// A verified cookie can outlive the process that minted it; recreating
    /// the session here just means its server-side state starts empty again.
    #[must_use]
    pub fn get_or_create(&self, id: &str) -> Session {
        {
            let guard = self.inner.sessions.read().unwrap();
            if let Some(session) = guard.get(id) {
                return session.clone();
            }
        }

        self.create_with_id(id)
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let mut guard = self.inner.sessions.write().unwrap();
        guard.remove(id)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sessions.read().unwrap().len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions that have been idle longer than the timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_with_timeout(DEFAULT_SESSION_TIMEOUT)
    }

    /// Remove sessions idle longer than a custom timeout.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.inner.sessions.write().unwrap();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.inner
            .sessions
            .read()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }
}
