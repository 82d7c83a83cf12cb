use serde::{Deserialize, Serialize};

use super::defaults;

/// Termination policy and concurrency bounds for one-to-one sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Close once the inbound turn counter reaches this value.
    pub max_turns: u32,
    /// Close once the session has been open this long.
    pub max_duration_ms: u64,
    /// Close once nothing has happened for this long.
    pub idle_timeout_ms: u64,
    /// How often the idle sweep runs.
    pub idle_check_interval_ms: u64,
    /// Upper bound on active sessions per identity.
    pub max_concurrent_sessions: usize,
    /// Upper bound on active sessions with one peer.
    pub max_sessions_per_target: usize,
    /// Consecutive empty replies that end a session.
    pub max_consecutive_empty_replies: u32,
    /// Marker that ends a conversation when present in a message.
    pub end_marker: String,
    /// Append `end_marker` to the final outbound message on close.
    pub append_end_marker_on_close: bool,
    /// Reply with `end_marker` when the peer ends the conversation.
    pub acknowledge_peer_end: bool,
    /// Deadline handed to the dispatcher for a normal reply.
    pub reply_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: defaults::DEFAULT_MAX_TURNS,
            max_duration_ms: defaults::DEFAULT_MAX_DURATION_MS,
            idle_timeout_ms: defaults::DEFAULT_IDLE_TIMEOUT_MS,
            idle_check_interval_ms: defaults::DEFAULT_IDLE_CHECK_INTERVAL_MS,
            max_concurrent_sessions: defaults::DEFAULT_MAX_CONCURRENT_SESSIONS,
            max_sessions_per_target: defaults::DEFAULT_MAX_SESSIONS_PER_TARGET,
            max_consecutive_empty_replies: defaults::DEFAULT_MAX_CONSECUTIVE_EMPTY_REPLIES,
            end_marker: defaults::DEFAULT_END_MARKER.to_string(),
            append_end_marker_on_close: defaults::DEFAULT_APPEND_END_MARKER_ON_CLOSE,
            acknowledge_peer_end: defaults::DEFAULT_ACKNOWLEDGE_PEER_END,
            reply_timeout_ms: defaults::DEFAULT_REPLY_TIMEOUT_MS,
        }
    }
}
