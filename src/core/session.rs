//! Transient per-interaction selection state.
//!
//! Sessions live in a single in-process map guarded by a mutex. Every write
//! replaces the whole [`Session`], so readers never observe a half-applied
//! transition. Entries expire `ttl` after their last write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::outline::Outline;
use super::topic::Topic;

/// Where a live session sits in the selection flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    /// Topics shown, waiting for a topic pick
    TopicsPresented,
    /// Outlines shown, waiting for an outline pick
    OutlineOptionsPresented,
}

/// Selection state for one interaction token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Interaction token from the messaging platform.
    pub token: String,
    pub topics: Vec<Topic>,
    pub selected_topic_index: Option<usize>,
    pub outlines: Vec<Outline>,
    pub selected_outline_index: Option<usize>,
}

impl Session {
    /// A fresh session presenting `topics`.
    pub fn new(token: impl Into<String>, topics: Vec<Topic>) -> Self {
        Self {
            token: token.into(),
            topics,
            selected_topic_index: None,
            outlines: Vec::new(),
            selected_outline_index: None,
        }
    }

    /// Current stage, derived from which selections have been made.
    pub fn stage(&self) -> SessionStage {
        if self.selected_topic_index.is_some() {
            SessionStage::OutlineOptionsPresented
        } else {
            SessionStage::TopicsPresented
        }
    }

    /// The session after a topic pick, with that topic's outlines.
    pub fn with_topic_selected(mut self, index: usize, outlines: Vec<Outline>) -> Self {
        self.selected_topic_index = Some(index);
        self.outlines = outlines;
        self.selected_outline_index = None;
        self
    }

    /// The session after an outline pick.
    pub fn with_outline_selected(mut self, index: usize) -> Self {
        self.selected_outline_index = Some(index);
        self
    }

    /// The chosen topic, if any.
    pub fn selected_topic(&self) -> Option<&Topic> {
        self.selected_topic_index.and_then(|i| self.topics.get(i))
    }

    /// The chosen outline, if any.
    pub fn selected_outline(&self) -> Option<&Outline> {
        self.selected_outline_index.and_then(|i| self.outlines.get(i))
    }

    /// Whether the selection indices and outlines agree with each other.
    pub fn is_consistent(&self) -> bool {
        let topic_ok = self.selected_topic_index.map_or(true, |i| i < self.topics.len());
        let outline_ok = self.selected_outline_index.map_or(true, |i| i < self.outlines.len());
        let outlines_ok = self.outlines.is_empty() || self.selected_topic_index.is_some();
        topic_ok && outline_ok && outlines_ok
    }
}

/// Why a session could not be claimed for a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("session not found")]
    NotFound,

    #[error("a selection is already being processed")]
    InFlight,

    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug)]
struct Entry {
    session: Session,
    written_at: Instant,
    in_flight: bool,
}

/// In-memory session map with expiry.
#[derive(Debug)]
pub struct SessionStore {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store whose sessions expire `ttl` after their last write.
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl }
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.written_at.elapsed() >= self.ttl
    }

    /// Insert or replace the session stored under its token.
    pub fn put(&self, session: Session) {
        let token = session.token.clone();
        self.entries
            .lock()
            .insert(token, Entry { session, written_at: Instant::now(), in_flight: false });
    }

    /// Snapshot of the live session for `token`.
    pub fn get(&self, token: &str) -> Option<Session> {
        let mut entries = self.entries.lock();
        match entries.get(token) {
            Some(entry) if self.is_expired(entry) => {
                entries.remove(token);
                None
            }
            Some(entry) => Some(entry.session.clone()),
            None => None,
        }
    }

    /// Remove the session for `token`. Returns whether one existed.
    pub fn delete(&self, token: &str) -> bool {
        self.entries.lock().remove(token).is_some()
    }

    /// Reserve the session for a transition.
    ///
    /// `validate` runs under the lock. On success the entry is marked
    /// in flight, so competing claims fail with [`ClaimError::InFlight`]
    /// until the transition ends with [`put`](Self::put),
    /// [`delete`](Self::delete) or [`release`](Self::release). A failed
    /// claim leaves the entry untouched.
    pub fn claim<F>(&self, token: &str, validate: F) -> Result<Session, ClaimError>
    where
        F: FnOnce(&Session) -> Result<(), String>,
    {
        let mut entries = self.entries.lock();
        let expired = match entries.get(token) {
            None => return Err(ClaimError::NotFound),
            Some(entry) => self.is_expired(entry),
        };
        if expired {
            entries.remove(token);
            return Err(ClaimError::NotFound);
        }

        let entry = entries.get_mut(token).ok_or(ClaimError::NotFound)?;
        if entry.in_flight {
            return Err(ClaimError::InFlight);
        }
        validate(&entry.session).map_err(ClaimError::Rejected)?;

        entry.in_flight = true;
        Ok(entry.session.clone())
    }

    /// Clear the in-flight mark without changing the session.
    pub fn release(&self, token: &str) {
        if let Some(entry) = self.entries.lock().get_mut(token) {
            entry.in_flight = false;
        }
    }

    /// Guard that releases the claim on `token` unless settled first.
    ///
    /// Covers transitions that unwind or are dropped before they write the
    /// store.
    pub fn claim_guard(&self, token: impl Into<String>) -> ClaimGuard<'_> {
        ClaimGuard { store: self, token: token.into(), armed: true }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.entries.lock().values().filter(|e| !self.is_expired(e)).count()
    }

    /// Whether there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.written_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Periodically purge expired sessions on the tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Purged expired sessions");
                }
            }
        })
    }
}

/// Releases an in-flight claim when dropped while still armed.
#[derive(Debug)]
pub struct ClaimGuard<'a> {
    store: &'a SessionStore,
    token: String,
    armed: bool,
}

impl ClaimGuard<'_> {
    /// The transition wrote the store; nothing left to release.
    pub fn settle(mut self) {
        self.armed = false;
    }

    /// Give the claim back now.
    pub fn release(self) {}
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.release(&self.token);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }
}
