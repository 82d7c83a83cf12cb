//! Termination rules that do not need the session map.

use chrono::{DateTime, Duration, Utc};
use parley_core::config::SessionConfig;
use parley_core::models::CloseReason;

use crate::session::Session;

pub fn contains_end_marker(text: &str, end_marker: &str) -> bool {
    !end_marker.is_empty() && text.contains(end_marker)
}

pub fn is_empty_reply(text: &str) -> bool {
    text.trim().is_empty()
}

/// Append the end marker unless the text already carries it.
pub fn with_end_marker(text: &str, end_marker: &str) -> String {
    let trimmed = text.trim_end();
    if contains_end_marker(trimmed, end_marker) {
        trimmed.to_string()
    } else if trimmed.is_empty() {
        end_marker.to_string()
    } else {
        format!("{trimmed} {end_marker}")
    }
}

/// Instant at which the duration or idle limit fires, whichever is earlier.
pub fn time_limit_deadline(session: &Session, config: &SessionConfig) -> (DateTime<Utc>, CloseReason) {
    let duration_at = session.created_at() + Duration::milliseconds(config.max_duration_ms as i64);
    let idle_at = session.last_activity_at() + Duration::milliseconds(config.idle_timeout_ms as i64);
    if idle_at < duration_at {
        (idle_at, CloseReason::IdleTimeout)
    } else {
        (duration_at, CloseReason::MaxDuration)
    }
}

/// Hard limit reached at `now`, if any. Turns are checked first since they
/// are only ever reached on message arrival.
pub fn hard_limit(session: &Session, config: &SessionConfig, now: DateTime<Utc>) -> Option<CloseReason> {
    if session.turns() >= config.max_turns {
        return Some(CloseReason::MaxTurns);
    }
    let (at, reason) = time_limit_deadline(session, config);
    (now >= at).then_some(reason)
}
