//! Per-session message counts and conversation-depth gauges.
//!
//! Session records live for the process lifetime. Lookups take a shared
//! lock; only the first message of a new session takes the write lock.
//! Depth aggregates (total messages, session count, maximum) are updated
//! incrementally in O(1) and published while holding the lock scoped to
//! those two gauges, so the published average always matches the totals
//! once updates quiesce.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::store::MetricStore;
use crate::telemetry;
use crate::{AnalyticsError, Result};

/// Outcome of recording one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUpdate {
    /// Messages in this session, including the one just recorded.
    pub message_count: u64,
    /// Whether this message opened the session.
    pub is_new: bool,
}

/// Current conversation-depth statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthStats {
    pub sessions: u64,
    pub messages: u64,
    pub max_messages: u64,
}

impl DepthStats {
    /// Mean messages per session; zero before any session exists.
    pub fn average(&self) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            self.messages as f64 / self.sessions as f64
        }
    }
}

/// Tracks message counts per session id.
pub struct SessionTracker {
    store: Arc<MetricStore>,
    sessions: RwLock<HashMap<String, Arc<AtomicU64>>>,
    depth: Mutex<DepthStats>,
}

impl SessionTracker {
    pub fn new(store: Arc<MetricStore>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
            depth: Mutex::new(DepthStats::default()),
        }
    }

    /// Count one incoming message for `session_id`.
    ///
    /// A first message increments `chat_sessions_total`; every message
    /// re-publishes the average and maximum depth gauges.
    pub fn record_message(&self, session_id: &str) -> Result<SessionUpdate> {
        let (count, is_new) = self.entry(session_id)?;
        let message_count = count.fetch_add(1, Ordering::AcqRel) + 1;

        if is_new {
            self.store.inc(telemetry::SESSIONS_TOTAL, &[])?;
        }
        self.publish(is_new, 1, message_count)?;

        Ok(SessionUpdate {
            message_count,
            is_new,
        })
    }

    /// Register a session before its first message.
    ///
    /// Returns `true` if the session was new. Known sessions are untouched.
    pub fn register(&self, session_id: &str) -> Result<bool> {
        let (_, is_new) = self.entry(session_id)?;
        if is_new {
            self.store.inc(telemetry::SESSIONS_TOTAL, &[])?;
            self.publish(true, 0, 0)?;
        }
        Ok(is_new)
    }

    /// Messages recorded for one session, if known.
    pub fn message_count(&self, session_id: &str) -> Option<u64> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session_id).map(|c| c.load(Ordering::Acquire))
    }

    pub fn depth(&self) -> DepthStats {
        *self.depth.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up or create the session record. Exactly one caller sees `true`.
    fn entry(&self, session_id: &str) -> Result<(Arc<AtomicU64>, bool)> {
        if session_id.is_empty() {
            return Err(AnalyticsError::InvalidEvent("empty session id".into()));
        }

        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(count) = sessions.get(session_id) {
                return Ok((Arc::clone(count), false));
            }
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = sessions.get(session_id) {
            return Ok((Arc::clone(count), false));
        }
        let count = Arc::new(AtomicU64::new(0));
        sessions.insert(session_id.to_string(), Arc::clone(&count));
        Ok((count, true))
    }

    fn publish(&self, is_new: bool, messages: u64, message_count: u64) -> Result<()> {
        let mut depth = self.depth.lock().unwrap_or_else(PoisonError::into_inner);
        if is_new {
            depth.sessions += 1;
        }
        depth.messages += messages;
        // Counts only grow, so one comparison keeps the maximum exact.
        depth.max_messages = depth.max_messages.max(message_count);

        self.store
            .set(telemetry::MESSAGES_PER_CHAT_AVG, &[], depth.average())?;
        self.store.set(
            telemetry::MESSAGES_PER_CHAT_MAX,
            &[],
            depth.max_messages as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> SessionTracker {
        let store = MetricStore::builder()
            .register_all(telemetry::catalog(None))
            .build()
            .unwrap();
        SessionTracker::new(Arc::new(store))
    }

    #[test]
    fn first_message_opens_session() {
        let t = tracker();
        let update = t.record_message("s1").unwrap();
        assert!(update.is_new);
        assert_eq!(update.message_count, 1);

        let update = t.record_message("s1").unwrap();
        assert!(!update.is_new);
        assert_eq!(update.message_count, 2);
        assert_eq!(t.message_count("s1"), Some(2));
    }

    #[test]
    fn empty_session_id_is_rejected() {
        let t = tracker();
        assert!(matches!(
            t.record_message(""),
            Err(AnalyticsError::InvalidEvent(_))
        ));
        assert_eq!(t.depth(), DepthStats::default());
    }

    #[test]
    fn register_counts_session_without_messages() {
        let t = tracker();
        assert!(t.register("s1").unwrap());
        assert!(!t.register("s1").unwrap());
        t.record_message("s2").unwrap();
        t.record_message("s2").unwrap();

        let depth = t.depth();
        assert_eq!(depth.sessions, 2);
        assert_eq!(depth.messages, 2);
        assert_eq!(depth.average(), 1.0);

        // The first message of a pre-registered session is not a new session.
        let update = t.record_message("s1").unwrap();
        assert!(!update.is_new);
        assert_eq!(t.depth().sessions, 2);
    }

    #[test]
    fn average_of_empty_tracker_is_zero() {
        assert_eq!(DepthStats::default().average(), 0.0);
    }
}
