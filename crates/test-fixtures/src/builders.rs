//! Builders for domain values with sensible test defaults.

use chrono::{DateTime, Duration, TimeZone, Utc};
use parley_core::config::{AccountConfig, ParleyConfig};
use parley_core::models::{
    Aid, ClosedSession, CloseReason, Contact, DirectMessage, GroupMessage, SessionSnapshot,
    SessionStatus, TranscriptEntry,
};

/// Fixed reference instant so time arithmetic in tests is readable.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// `t0() + ms`.
pub fn at_ms(ms: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(ms)
}

pub fn aid(s: &str) -> Aid {
    Aid::from(s)
}

pub fn account(id: &str, aid: &str, name: &str) -> AccountConfig {
    AccountConfig {
        id: id.to_string(),
        aid: aid.to_string(),
        name: name.to_string(),
        aliases: Vec::new(),
    }
}

/// Default config with AI refinement off and memory storage, so tests stay
/// deterministic unless they opt in.
pub fn test_config() -> ParleyConfig {
    let mut config = ParleyConfig::default();
    config.scoring.ai_refinement = false;
    config.storage.backend = parley_core::config::StorageBackend::Memory;
    config
}

pub fn contact(aid_str: &str) -> Contact {
    Contact::new(Aid::from(aid_str), t0())
}

pub fn direct_message(receiver: &str, sender: &str, session_key: Option<&str>, content: &str) -> DirectMessage {
    DirectMessage {
        receiver: Aid::from(receiver),
        sender: Aid::from(sender),
        session_key: session_key.map(str::to_string),
        content: content.to_string(),
        received_at: t0(),
    }
}

pub fn group_message(group_id: &str, msg_id: u64, sender: &str, content: &str) -> GroupMessage {
    GroupMessage {
        msg_id,
        group_id: group_id.to_string(),
        sender: Aid::from(sender),
        content: content.to_string(),
        sent_at: at_ms(msg_id as i64 * 100),
    }
}

/// A closed session that lasted `duration_secs` over `turns` turns.
pub fn closed_session(target: &str, reason: CloseReason, turns: u32, duration_secs: i64) -> ClosedSession {
    let created = t0();
    let closed_at = created + Duration::seconds(duration_secs);
    ClosedSession {
        session: SessionSnapshot {
            session_id: format!("sess-{target}-{turns}"),
            target: Aid::from(target),
            is_owner: false,
            status: SessionStatus::Closed,
            turns,
            consecutive_empty_replies: 0,
            created_at: created,
            last_activity_at: closed_at,
            closed_at: Some(closed_at),
            close_reason: Some(reason),
        },
        reason,
        closed_at,
        transcript: (0..turns.min(4))
            .map(|i| TranscriptEntry {
                from_peer: i % 2 == 0,
                content: format!("message {i}"),
            })
            .collect(),
    }
}
