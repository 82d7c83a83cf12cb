//! A single one-to-one conversation.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parley_core::constants::{TRANSCRIPT_ENTRY_MAX_CHARS, TRANSCRIPT_TAIL_ENTRIES};
use parley_core::models::{
    Aid, ClosedSession, CloseReason, SessionSnapshot, SessionStatus, TranscriptEntry,
};

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    target: Aid,
    is_owner: bool,
    status: SessionStatus,
    turns: u32,
    consecutive_empty_replies: u32,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    transcript: VecDeque<TranscriptEntry>,
}

impl Session {
    pub fn new(id: String, target: Aid, is_owner: bool, now: DateTime<Utc>) -> Self {
        Self {
            id,
            target,
            is_owner,
            status: SessionStatus::Active,
            turns: 0,
            consecutive_empty_replies: 0,
            created_at: now,
            last_activity_at: now,
            transcript: VecDeque::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> &Aid {
        &self.target
    }

    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn consecutive_empty_replies(&self) -> u32 {
        self.consecutive_empty_replies
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn is_open(&self) -> bool {
        self.status != SessionStatus::Closed
    }

    /// Count one inbound message. Empty messages extend the empty streak.
    pub(crate) fn record_inbound(&mut self, content: &str, now: DateTime<Utc>) {
        self.turns = self.turns.saturating_add(1);
        self.touch(now);
        if content.trim().is_empty() {
            self.consecutive_empty_replies += 1;
        } else {
            self.consecutive_empty_replies = 0;
            self.push_transcript(true, content);
        }
    }

    /// Record one of our replies.
    pub(crate) fn record_outbound(&mut self, content: &str, now: DateTime<Utc>) {
        self.touch(now);
        self.consecutive_empty_replies = 0;
        self.push_transcript(false, content);
    }

    pub(crate) fn record_empty_reply(&mut self) {
        self.consecutive_empty_replies += 1;
    }

    /// The close decision is made; the final outbound message is pending.
    pub(crate) fn begin_closing(&mut self) {
        if self.status == SessionStatus::Active {
            self.status = SessionStatus::Closing;
        }
    }

    /// Terminal transition. Consumes the session so nothing can mutate it after.
    pub(crate) fn close(mut self, reason: CloseReason, now: DateTime<Utc>) -> ClosedSession {
        self.status = SessionStatus::Closed;
        let mut session = self.snapshot();
        session.closed_at = Some(now);
        session.close_reason = Some(reason);
        ClosedSession {
            session,
            reason,
            closed_at: now,
            transcript: self.transcript.into_iter().collect(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            target: self.target.clone(),
            is_owner: self.is_owner,
            status: self.status,
            turns: self.turns,
            consecutive_empty_replies: self.consecutive_empty_replies,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
            closed_at: None,
            close_reason: None,
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        // Clock skew must not move activity backwards.
        if now > self.last_activity_at {
            self.last_activity_at = now;
        }
    }

    fn push_transcript(&mut self, from_peer: bool, content: &str) {
        if self.transcript.len() == TRANSCRIPT_TAIL_ENTRIES {
            self.transcript.pop_front();
        }
        self.transcript.push_back(TranscriptEntry {
            from_peer,
            content: content.chars().take(TRANSCRIPT_ENTRY_MAX_CHARS).collect(),
        });
    }
}
