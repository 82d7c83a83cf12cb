//! One-to-one session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Aid;

/// Session lifecycle status. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Closing,
    Closed,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Our own reply carried the end marker.
    EndMarker,
    /// The peer sent the end marker.
    PeerEnded,
    /// Too many consecutive empty replies.
    EmptyReplies,
    MaxTurns,
    MaxDuration,
    IdleTimeout,
    /// Evicted to stay within a concurrency bound.
    LruEvicted,
    /// Replaced by a newer session to the same target.
    Superseded,
    /// Closed by the operator or by stopping the identity.
    Forced,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndMarker => "end_marker",
            Self::PeerEnded => "peer_ended",
            Self::EmptyReplies => "empty_replies",
            Self::MaxTurns => "max_turns",
            Self::MaxDuration => "max_duration",
            Self::IdleTimeout => "idle_timeout",
            Self::LruEvicted => "lru_evicted",
            Self::Superseded => "superseded",
            Self::Forced => "forced",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a session for status surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub target: Aid,
    /// True when the local identity opened the session.
    pub is_owner: bool,
    pub status: SessionStatus,
    /// Inbound message count.
    pub turns: u32,
    pub consecutive_empty_replies: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub close_reason: Option<CloseReason>,
}

/// One line of the in-memory transcript tail. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub from_peer: bool,
    pub content: String,
}

/// A session that has just been closed and removed from its manager.
/// Handed out exactly once so it is scored exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    pub session: SessionSnapshot,
    pub reason: CloseReason,
    pub closed_at: DateTime<Utc>,
    /// Most recent exchanges, used only for the quality rating.
    pub transcript: Vec<TranscriptEntry>,
}

impl ClosedSession {
    /// Wall-clock lifetime in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.closed_at - self.session.created_at)
            .num_milliseconds()
            .max(0) as u64
    }
}
