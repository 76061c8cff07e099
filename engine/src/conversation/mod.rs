//! Conversation session store
//!
//! Owns per-session message history with bounded memory: sessions expire
//! after inactivity, the store evicts least-recently-active sessions past
//! its capacity, and each session FIFO-trims its oldest messages past the
//! per-session limit. Dropped messages are unrecoverable; none of this is
//! correctness-critical, it is a cost and memory bound.
//!
//! The store is the only component shared across concurrent queries. All
//! mutation happens under one internal lock with bounded critical
//! sections; the lock is never held across an await point (every method
//! here is synchronous).
//!
//! Store operations never fail: a missing or expired session means
//! "create a new one", and callers are expected to treat the returned
//! session id as authoritative.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Agent => write!(f, "agent"),
        }
    }
}

/// A single message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

/// One conversation thread. Owned exclusively by the store; mutated only
/// through append and trim.
#[derive(Debug, Clone)]
struct ConversationSession {
    session_id: String,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl ConversationSession {
    fn new(session_id: String, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }
}

/// Store bounds and timeouts.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of sessions held in memory
    pub max_sessions: usize,

    /// Inactivity window after which a session expires
    pub session_timeout: Duration,

    /// Maximum messages kept per session
    pub max_messages_per_session: usize,

    /// Character budget for the assembled conversation context
    pub max_context_length: usize,

    /// Gap after which a follow-up message starts a new session
    pub consecutive_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            session_timeout: Duration::minutes(30),
            max_messages_per_session: 50,
            max_context_length: 4000,
            consecutive_timeout: Duration::minutes(5),
        }
    }
}

/// Stats returned alongside an assembled conversation context.
#[derive(Debug, Clone, Serialize)]
pub struct ContextStats {
    pub session_id: String,

    /// Characters of line content in the context (newlines excluded)
    pub context_length: usize,

    /// Lines included in the context, current question line included
    pub message_count: usize,

    /// Messages currently held by the session
    pub total_session_messages: usize,

    /// Whether any history was dropped to fit the budget
    pub truncated: bool,
}

impl ContextStats {
    fn empty(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            context_length: 0,
            message_count: 0,
            total_session_messages: 0,
            truncated: false,
        }
    }
}

/// Per-session statistics for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub total_messages: usize,
    pub user_messages: usize,
    pub agent_messages: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// What to do with an incoming session reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// The referenced session is live; use it in place.
    Reuse,

    /// No usable session (none referenced, missing, or expired);
    /// allocate a fresh one.
    Create,

    /// The session is live but its last message is too old; the
    /// conversation has moved on, so start a new session.
    Rotate,
}

/// The fields the session policy depends on.
#[derive(Debug, Clone, Copy)]
pub struct SessionView {
    pub last_activity: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// Decide whether an incoming reference reuses, recreates, or rotates its
/// session. Pure; the store applies the result under its lock.
pub fn decide_session_action(
    session: Option<SessionView>,
    now: DateTime<Utc>,
    config: &StoreConfig,
) -> SessionAction {
    let Some(view) = session else {
        return SessionAction::Create;
    };
    if now - view.last_activity > config.session_timeout {
        return SessionAction::Create;
    }
    match view.last_message_at {
        Some(at) if now - at > config.consecutive_timeout => SessionAction::Rotate,
        _ => SessionAction::Reuse,
    }
}

/// Conversation store with session tracking and bounded memory.
///
/// Cheap to clone; clones share the same session map.
#[derive(Clone)]
pub struct ConversationStore {
    config: StoreConfig,
    sessions: Arc<RwLock<HashMap<String, ConversationSession>>>,
}

impl ConversationStore {
    pub fn new(config: StoreConfig) -> Self {
        info!(
            "ConversationStore initialized: max_sessions={}, session_timeout={}min, \
             max_messages={}, max_context={}chars",
            config.max_sessions,
            config.session_timeout.num_minutes(),
            config.max_messages_per_session,
            config.max_context_length
        );
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Resolve a session: reuse a live one, or allocate a fresh one.
    /// Runs eviction first.
    pub fn get_or_create_session(&self, requested: Option<&str>) -> String {
        self.get_or_create_session_at(requested, Utc::now())
    }

    /// [`Self::get_or_create_session`] with an explicit clock reading.
    pub fn get_or_create_session_at(
        &self,
        requested: Option<&str>,
        now: DateTime<Utc>,
    ) -> String {
        let mut sessions = self.sessions.write().expect("session map lock poisoned");
        Self::evict(&mut sessions, &self.config, now);

        if let Some(id) = requested {
            if let Some(session) = sessions.get_mut(id) {
                session.last_activity = now;
                return id.to_string();
            }
        }

        Self::create_session(&mut sessions, &self.config, requested.unwrap_or("default"), now)
    }

    /// Append a message. A missing session is recreated (recovery, never
    /// fatal); a too-old last message rotates to a new session first.
    pub fn add_message(&self, session_id: &str, sender: Sender, text: &str) -> bool {
        self.add_message_at(session_id, sender, text, Utc::now())
    }

    /// [`Self::add_message`] with an explicit clock reading.
    pub fn add_message_at(
        &self,
        session_id: &str,
        sender: Sender,
        text: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let mut sessions = self.sessions.write().expect("session map lock poisoned");
        Self::evict(&mut sessions, &self.config, now);

        let view = sessions.get(session_id).map(|s| SessionView {
            last_activity: s.last_activity,
            last_message_at: s.messages.last().map(|m| m.timestamp),
        });

        let target_id = match decide_session_action(view, now, &self.config) {
            SessionAction::Reuse => session_id.to_string(),
            SessionAction::Create => {
                warn!("Session {} not found, recreating", session_id);
                Self::create_session(&mut sessions, &self.config, session_id, now)
            }
            SessionAction::Rotate => {
                info!(
                    "Time gap exceeded for session {}, starting new session",
                    session_id
                );
                Self::create_session(&mut sessions, &self.config, "default", now)
            }
        };

        let Some(session) = sessions.get_mut(&target_id) else {
            return false;
        };

        session.messages.push(Message {
            sender,
            text: text.to_string(),
            timestamp: now,
            session_id: target_id.clone(),
        });
        session.last_activity = now;

        if session.messages.len() > self.config.max_messages_per_session {
            let excess = session.messages.len() - self.config.max_messages_per_session;
            session.messages.drain(..excess);
            debug!(
                "Trimmed {} old messages from session {}",
                excess, target_id
            );
        }

        true
    }

    /// Build a turn-labelled transcript for the current question, newest
    /// history first under the character budget, restored to chronological
    /// order. The question line is appended only if it still fits.
    pub fn get_conversation_context(
        &self,
        session_id: &str,
        current_question: &str,
    ) -> (String, ContextStats) {
        let sessions = self.sessions.read().expect("session map lock poisoned");
        let Some(session) = sessions.get(session_id) else {
            return (String::new(), ContextStats::empty(session_id));
        };
        if session.messages.is_empty() {
            return (String::new(), ContextStats::empty(session_id));
        }

        let mut kept: Vec<String> = Vec::new();
        let mut total_length = 0usize;

        for message in session.messages.iter().rev() {
            let line = format!("{}: {}", message.sender, message.text);
            if total_length + line.len() > self.config.max_context_length {
                break;
            }
            total_length += line.len();
            kept.push(line);
        }
        kept.reverse();
        let kept_history = kept.len();

        let question_line = format!("user: {}", current_question);
        if total_length + question_line.len() <= self.config.max_context_length {
            total_length += question_line.len();
            kept.push(question_line);
        }

        let stats = ContextStats {
            session_id: session_id.to_string(),
            context_length: total_length,
            message_count: kept.len(),
            total_session_messages: session.messages.len(),
            truncated: kept_history < session.messages.len(),
        };

        debug!(
            "Context for session {}: {}/{} messages, {} chars",
            session_id, kept_history, session.messages.len(), total_length
        );

        (kept.join("\n"), stats)
    }

    /// Statistics for one session, if it is live.
    pub fn session_stats(&self, session_id: &str) -> Option<SessionStats> {
        let sessions = self.sessions.read().expect("session map lock poisoned");
        let session = sessions.get(session_id)?;
        Some(SessionStats {
            session_id: session.session_id.clone(),
            total_messages: session.messages.len(),
            user_messages: session
                .messages
                .iter()
                .filter(|m| m.sender == Sender::User)
                .count(),
            agent_messages: session
                .messages
                .iter()
                .filter(|m| m.sender == Sender::Agent)
                .count(),
            created_at: session.created_at,
            last_activity: session.last_activity,
        })
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .expect("session map lock poisoned")
            .len()
    }

    /// Snapshot of a session's messages (empty if the session is gone).
    pub fn messages(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .read()
            .expect("session map lock poisoned")
            .get(session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Two-phase eviction: drop expired sessions, then least-recently-active
    /// sessions past capacity.
    fn evict(
        sessions: &mut HashMap<String, ConversationSession>,
        config: &StoreConfig,
        now: DateTime<Utc>,
    ) {
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_activity <= config.session_timeout);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!("Removed {} expired sessions", expired);
        }

        while sessions.len() > config.max_sessions {
            Self::remove_least_recent(sessions);
        }
    }

    fn create_session(
        sessions: &mut HashMap<String, ConversationSession>,
        config: &StoreConfig,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> String {
        // Clear room first so the insert keeps the store within capacity.
        while sessions.len() >= config.max_sessions {
            Self::remove_least_recent(sessions);
        }

        let id = Self::allocate_id(sessions, identifier, now);
        sessions.insert(id.clone(), ConversationSession::new(id.clone(), now));
        info!("Created conversation session {}", id);
        id
    }

    fn remove_least_recent(sessions: &mut HashMap<String, ConversationSession>) {
        let oldest = sessions
            .iter()
            .min_by_key(|(_, s)| s.last_activity)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            sessions.remove(&id);
            debug!("Removed session {} due to session limit", id);
        }
    }

    /// Derive a unique session id from an identifier and the current time,
    /// with a uuid suffix on the (rare) same-second collision.
    fn allocate_id(
        sessions: &HashMap<String, ConversationSession>,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> String {
        let base = format!("{}_{}", identifier, now.timestamp());
        if !sessions.contains_key(&base) {
            return base;
        }
        format!("{}_{}", base, Uuid::new_v4().simple())
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn small_config() -> StoreConfig {
        StoreConfig {
            max_sessions: 3,
            session_timeout: Duration::seconds(60),
            max_messages_per_session: 2,
            max_context_length: 100,
            consecutive_timeout: Duration::seconds(10),
        }
    }

    #[test]
    fn test_decide_create_when_missing() {
        let config = StoreConfig::default();
        assert_eq!(
            decide_session_action(None, at(0), &config),
            SessionAction::Create
        );
    }

    #[test]
    fn test_decide_reuse_when_fresh() {
        let config = small_config();
        let view = SessionView {
            last_activity: at(0),
            last_message_at: Some(at(0)),
        };
        assert_eq!(
            decide_session_action(Some(view), at(5), &config),
            SessionAction::Reuse
        );
    }

    #[test]
    fn test_decide_create_when_expired() {
        let config = small_config();
        let view = SessionView {
            last_activity: at(0),
            last_message_at: Some(at(0)),
        };
        assert_eq!(
            decide_session_action(Some(view), at(61), &config),
            SessionAction::Create
        );
    }

    #[test]
    fn test_decide_rotate_after_gap() {
        let config = small_config();
        let view = SessionView {
            last_activity: at(0),
            last_message_at: Some(at(0)),
        };
        assert_eq!(
            decide_session_action(Some(view), at(11), &config),
            SessionAction::Rotate
        );
    }

    #[test]
    fn test_empty_session_has_no_gap() {
        let config = small_config();
        let view = SessionView {
            last_activity: at(0),
            last_message_at: None,
        };
        assert_eq!(
            decide_session_action(Some(view), at(30), &config),
            SessionAction::Reuse
        );
    }

    #[test]
    fn test_reuse_refreshes_activity() {
        let store = ConversationStore::new(small_config());
        let id = store.get_or_create_session_at(None, at(0));
        let same = store.get_or_create_session_at(Some(&id), at(30));
        assert_eq!(id, same);
        // Refreshed at t=30, so still alive at t=80
        let again = store.get_or_create_session_at(Some(&id), at(80));
        assert_eq!(id, again);
    }

    #[test]
    fn test_trim_keeps_most_recent_in_order() {
        let store = ConversationStore::new(small_config());
        let id = store.get_or_create_session_at(Some("s1"), at(0));
        assert!(store.add_message_at(&id, Sender::User, "a", at(1)));
        assert!(store.add_message_at(&id, Sender::Agent, "b", at(2)));
        assert!(store.add_message_at(&id, Sender::User, "c", at(3)));

        let messages = store.messages(&id);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::Agent);
        assert_eq!(messages[0].text, "b");
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[1].text, "c");
    }

    #[test]
    fn test_missing_session_recreated_under_new_id() {
        let store = ConversationStore::new(small_config());
        assert!(store.add_message_at("ghost", Sender::User, "hello", at(0)));
        // The ghost id itself was never registered; a derived id was.
        assert!(store.session_stats("ghost").is_none());
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_gap_rotates_to_new_session() {
        let store = ConversationStore::new(small_config());
        let id = store.get_or_create_session_at(Some("s1"), at(0));
        store.add_message_at(&id, Sender::User, "first", at(1));
        // 11s later: beyond the 10s consecutive timeout
        store.add_message_at(&id, Sender::User, "second", at(12));

        let messages = store.messages(&id);
        assert_eq!(messages.len(), 1, "old session must not receive the message");
        assert_eq!(store.session_count(), 2);
    }

    #[test]
    fn test_eviction_bound_holds() {
        let store = ConversationStore::new(small_config());
        for i in 0..10 {
            store.get_or_create_session_at(Some(&format!("u{}", i)), at(i));
        }
        assert!(store.session_count() <= 3);
    }

    #[test]
    fn test_eviction_removes_least_recent() {
        let store = ConversationStore::new(small_config());
        let a = store.get_or_create_session_at(Some("a"), at(0));
        let b = store.get_or_create_session_at(Some("b"), at(1));
        let c = store.get_or_create_session_at(Some("c"), at(2));
        // Touch a so b becomes the least recent
        store.get_or_create_session_at(Some(&a), at(3));
        store.get_or_create_session_at(Some("d"), at(4));

        assert!(store.session_stats(&a).is_some());
        assert!(store.session_stats(&b).is_none());
        assert!(store.session_stats(&c).is_some());
    }

    #[test]
    fn test_expired_session_absent_after_next_operation() {
        let store = ConversationStore::new(small_config());
        let id = store.get_or_create_session_at(Some("s1"), at(0));
        // 61s later: past the 60s timeout; any store operation evicts it
        store.get_or_create_session_at(Some("other"), at(61));
        assert!(store.session_stats(&id).is_none());
    }

    #[test]
    fn test_context_windowing_drops_oldest_first() {
        let config = StoreConfig {
            max_context_length: 30,
            ..small_config()
        };
        let store = ConversationStore::new(StoreConfig {
            max_messages_per_session: 50,
            ..config
        });
        let id = store.get_or_create_session_at(Some("s1"), at(0));
        store.add_message_at(&id, Sender::User, "older message", at(1));
        store.add_message_at(&id, Sender::Agent, "newer", at(2));

        let (context, stats) = store.get_conversation_context(&id, "q");
        // "user: older message" (19) + "agent: newer" (12) = 31 > 30,
        // so only the newer line survives, then "user: q" (7) fits.
        assert_eq!(context, "agent: newer\nuser: q");
        assert!(stats.truncated);
        assert_eq!(stats.total_session_messages, 2);
        assert_eq!(stats.message_count, 2);
        assert!(stats.context_length <= 30);
    }

    #[test]
    fn test_context_question_dropped_when_over_budget() {
        let store = ConversationStore::new(StoreConfig {
            max_context_length: 15,
            max_messages_per_session: 50,
            ..small_config()
        });
        let id = store.get_or_create_session_at(Some("s1"), at(0));
        store.add_message_at(&id, Sender::User, "hi", at(1));

        let (context, stats) = store.get_conversation_context(&id, &"x".repeat(40));
        assert_eq!(context, "user: hi");
        assert_eq!(stats.message_count, 1);
    }

    #[test]
    fn test_context_for_unknown_session_is_empty() {
        let store = ConversationStore::new(small_config());
        let (context, stats) = store.get_conversation_context("nope", "q");
        assert!(context.is_empty());
        assert_eq!(stats.message_count, 0);
        assert!(!stats.truncated);
    }

    #[test]
    fn test_allocated_ids_are_unique_within_a_second() {
        let store = ConversationStore::new(StoreConfig {
            max_sessions: 10,
            ..small_config()
        });
        let first = store.get_or_create_session_at(None, at(0));
        let second = store.get_or_create_session_at(None, at(0));
        assert_ne!(first, second);
        assert_eq!(store.session_count(), 2);
    }

    #[test]
    fn test_session_stats_counts_by_sender() {
        let store = ConversationStore::new(StoreConfig {
            max_messages_per_session: 10,
            ..small_config()
        });
        let id = store.get_or_create_session_at(Some("s1"), at(0));
        store.add_message_at(&id, Sender::User, "q1", at(1));
        store.add_message_at(&id, Sender::Agent, "a1", at(2));
        store.add_message_at(&id, Sender::User, "q2", at(3));

        let stats = store.session_stats(&id).unwrap();
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.user_messages, 2);
        assert_eq!(stats.agent_messages, 1);
    }
}
