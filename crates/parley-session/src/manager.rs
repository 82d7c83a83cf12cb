//! SessionManager: the open sessions of one identity.
//!
//! Termination layers, in evaluation order:
//! 1. soft: end marker in our reply, or N consecutive empty messages
//! 2. protocol: end marker appended on close, peer end acknowledged
//! 3. hard: max turns, max duration, idle timeout (also via `sweep`)
//! 4. concurrency: per-target bound, then global bound, LRU eviction

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parley_core::config::SessionConfig;
use parley_core::errors::SessionError;
use parley_core::models::{Aid, ClosedSession, CloseReason, SessionSnapshot};
use parley_observability::events;
use tracing::debug;

use crate::policy::{contains_end_marker, hard_limit, is_empty_reply, with_end_marker};
use crate::session::Session;

/// Result of feeding one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundOutcome {
    pub session_id: String,
    /// A new session was admitted for this message.
    pub opened: bool,
    /// Sessions evicted to make room, in eviction order.
    pub evicted: Vec<ClosedSession>,
    /// Set when this message ended the session.
    pub closed: Option<ClosedSession>,
    /// Message the caller sends back before forgetting the session.
    pub farewell: Option<String>,
}

impl InboundOutcome {
    /// Whether the caller should produce a reply.
    pub fn wants_reply(&self) -> bool {
        self.closed.is_none()
    }
}

/// Result of feeding one of our replies.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundOutcome {
    /// Text to send. `None` for a suppressed empty reply.
    pub send: Option<String>,
    pub closed: Option<ClosedSession>,
}

/// Result of opening a session from our side.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundStart {
    pub session_id: String,
    pub superseded: Vec<ClosedSession>,
    pub evicted: Vec<ClosedSession>,
}

#[derive(Debug)]
pub struct SessionManager {
    identity_id: String,
    config: SessionConfig,
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new(identity_id: &str, config: &SessionConfig) -> Self {
        Self {
            identity_id: identity_id.to_string(),
            config: config.clone(),
            sessions: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Route an inbound message to its session, admitting a new one if needed.
    ///
    /// With `session_key` the peer's id is reused; without one the most
    /// recently active session with `target` is continued.
    pub fn on_inbound(
        &mut self,
        target: &Aid,
        session_key: Option<&str>,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<InboundOutcome, SessionError> {
        let existing = match session_key {
            Some(key) => match self.sessions.get(key) {
                Some(s) if s.target() != target => {
                    return Err(SessionError::TargetMismatch {
                        session_id: key.to_string(),
                        owner: s.target().to_string(),
                        target: target.to_string(),
                    })
                }
                Some(_) => Some(key.to_string()),
                None => None,
            },
            None => self.latest_for(target),
        };

        let mut evicted = Vec::new();
        let (session_id, opened) = match existing {
            Some(id) => (id, false),
            None => {
                let id = session_key
                    .map(str::to_string)
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                evicted = self.admit(target, now);
                self.insert(Session::new(id.clone(), target.clone(), false, now));
                (id, true)
            }
        };

        let Some(session) = self.sessions.get_mut(&session_id) else {
            return Err(SessionError::NotFound(session_id));
        };
        session.record_inbound(content, now);

        let end_marker = self.config.end_marker.clone();
        let close = if contains_end_marker(content, &end_marker) {
            Some(CloseReason::PeerEnded)
        } else if session.consecutive_empty_replies() >= self.config.max_consecutive_empty_replies {
            Some(CloseReason::EmptyReplies)
        } else {
            hard_limit(session, &self.config, now)
        };

        let mut outcome = InboundOutcome {
            session_id: session_id.clone(),
            opened,
            evicted,
            closed: None,
            farewell: None,
        };
        if let Some(reason) = close {
            outcome.farewell = match reason {
                CloseReason::PeerEnded if self.config.acknowledge_peer_end => Some(end_marker),
                CloseReason::PeerEnded => None,
                _ if self.config.append_end_marker_on_close => Some(end_marker),
                _ => None,
            };
            outcome.closed = self.remove(&session_id, reason, now);
        }
        Ok(outcome)
    }

    /// Open a session to `target` as owner. Every open session with the same
    /// target is closed as superseded first.
    pub fn start_outbound(&mut self, target: &Aid, now: DateTime<Utc>) -> OutboundStart {
        let stale: Vec<String> = self
            .sessions
            .values()
            .filter(|s| s.target() == target)
            .map(|s| s.id().to_string())
            .collect();
        let superseded = stale
            .iter()
            .filter_map(|id| self.remove(id, CloseReason::Superseded, now))
            .collect();

        let evicted = self.admit(target, now);
        let id = uuid::Uuid::new_v4().to_string();
        self.insert(Session::new(id.clone(), target.clone(), true, now));
        OutboundStart {
            session_id: id,
            superseded,
            evicted,
        }
    }

    /// Apply the termination policy to one of our replies.
    pub fn on_outbound(
        &mut self,
        session_id: &str,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<OutboundOutcome, SessionError> {
        let config = &self.config;
        let Some(session) = self.sessions.get_mut(session_id) else {
            return Err(SessionError::NotFound(session_id.to_string()));
        };

        if is_empty_reply(reply) {
            session.record_empty_reply();
            if session.consecutive_empty_replies() < config.max_consecutive_empty_replies {
                return Ok(OutboundOutcome {
                    send: None,
                    closed: None,
                });
            }
            let send = config
                .append_end_marker_on_close
                .then(|| config.end_marker.clone());
            session.begin_closing();
            let closed = self.remove(session_id, CloseReason::EmptyReplies, now);
            return Ok(OutboundOutcome { send, closed });
        }

        session.record_outbound(reply, now);
        let reason = if contains_end_marker(reply, &config.end_marker) {
            Some(CloseReason::EndMarker)
        } else {
            hard_limit(session, config, now)
        };

        let Some(reason) = reason else {
            return Ok(OutboundOutcome {
                send: Some(reply.to_string()),
                closed: None,
            });
        };
        session.begin_closing();
        let send = if config.append_end_marker_on_close {
            with_end_marker(reply, &config.end_marker)
        } else {
            reply.to_string()
        };
        let closed = self.remove(session_id, reason, now);
        Ok(OutboundOutcome {
            send: Some(send),
            closed,
        })
    }

    /// Close every session whose idle or duration limit has passed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<ClosedSession> {
        let due: Vec<(String, CloseReason)> = self
            .sessions
            .values()
            .filter_map(|s| hard_limit(s, &self.config, now).map(|r| (s.id().to_string(), r)))
            .collect();
        due.into_iter()
            .filter_map(|(id, reason)| self.remove(&id, reason, now))
            .collect()
    }

    pub fn close(
        &mut self,
        session_id: &str,
        reason: CloseReason,
        now: DateTime<Utc>,
    ) -> Option<ClosedSession> {
        self.remove(session_id, reason, now)
    }

    pub fn close_all(&mut self, reason: CloseReason, now: DateTime<Utc>) -> Vec<ClosedSession> {
        let ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.iter()
            .filter_map(|id| self.remove(id, reason, now))
            .collect()
    }

    pub fn get(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.sessions.get(session_id).map(Session::snapshot)
    }

    /// Read-only views, oldest first.
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        let mut all: Vec<SessionSnapshot> = self.sessions.values().map(Session::snapshot).collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        all
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn count_for(&self, target: &Aid) -> usize {
        self.sessions.values().filter(|s| s.target() == target).count()
    }

    fn latest_for(&self, target: &Aid) -> Option<String> {
        self.sessions
            .values()
            .filter(|s| s.target() == target)
            .max_by(|a, b| {
                a.last_activity_at()
                    .cmp(&b.last_activity_at())
                    .then_with(|| a.created_at().cmp(&b.created_at()))
            })
            .map(|s| s.id().to_string())
    }

    /// Evict until one more session for `target` fits both bounds.
    /// The per-target bound is evaluated first.
    fn admit(&mut self, target: &Aid, now: DateTime<Utc>) -> Vec<ClosedSession> {
        let mut evicted = Vec::new();
        while self.count_for(target) >= self.config.max_sessions_per_target {
            match self.lru(Some(target)) {
                Some(id) => evicted.extend(self.evict(&id, true, now)),
                None => break,
            }
        }
        while self.sessions.len() >= self.config.max_concurrent_sessions {
            match self.lru(None) {
                Some(id) => evicted.extend(self.evict(&id, false, now)),
                None => break,
            }
        }
        evicted
    }

    fn lru(&self, target: Option<&Aid>) -> Option<String> {
        self.sessions
            .values()
            .filter(|s| target.map_or(true, |t| s.target() == t))
            .min_by(|a, b| {
                a.last_activity_at()
                    .cmp(&b.last_activity_at())
                    .then_with(|| a.created_at().cmp(&b.created_at()))
                    .then_with(|| a.id().cmp(b.id()))
            })
            .map(|s| s.id().to_string())
    }

    fn evict(&mut self, session_id: &str, per_target: bool, now: DateTime<Utc>) -> Option<ClosedSession> {
        let closed = self.remove(session_id, CloseReason::LruEvicted, now)?;
        events::session_evicted(
            &self.identity_id,
            session_id,
            closed.session.target.as_str(),
            per_target,
        );
        Some(closed)
    }

    fn insert(&mut self, session: Session) {
        events::session_opened(
            &self.identity_id,
            session.id(),
            session.target().as_str(),
            session.is_owner(),
        );
        self.sessions.insert(session.id().to_string(), session);
    }

    fn remove(&mut self, session_id: &str, reason: CloseReason, now: DateTime<Utc>) -> Option<ClosedSession> {
        let session = self.sessions.remove(session_id)?;
        debug!(
            identity = %self.identity_id,
            session_id = %session_id,
            reason = %reason,
            turns = session.turns(),
            "session removed"
        );
        Some(session.close(reason, now))
    }
}
