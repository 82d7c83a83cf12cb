//! Structured log events for key lifecycle transitions.
//!
//! Each function emits a `tracing` event with an `event` field so log
//! pipelines can filter on it without parsing messages.

/// A one-to-one session was admitted.
pub fn session_opened(identity: &str, session_id: &str, target: &str, is_owner: bool) {
    tracing::info!(
        event = "session_opened",
        identity = %identity,
        session_id = %session_id,
        target = %target,
        is_owner = is_owner,
        "session opened"
    );
}

/// A session closed and was scored.
pub fn session_closed(
    identity: &str,
    session_id: &str,
    reason: &str,
    turns: u32,
    duration_ms: u64,
    final_score: u8,
) {
    tracing::info!(
        event = "session_closed",
        identity = %identity,
        session_id = %session_id,
        reason = %reason,
        turns = turns,
        duration_ms = duration_ms,
        final_score = final_score,
        "session closed"
    );
}

/// A session was evicted to respect a concurrency bound.
pub fn session_evicted(identity: &str, session_id: &str, target: &str, per_target: bool) {
    tracing::info!(
        event = "session_evicted",
        identity = %identity,
        session_id = %session_id,
        target = %target,
        bound = if per_target { "per_target" } else { "global" },
        "session evicted"
    );
}

/// A group batch was handed to the dispatcher.
pub fn group_batch_dispatched(identity: &str, group_id: &str, ticket: u64, messages: usize) {
    tracing::info!(
        event = "group_batch_dispatched",
        identity = %identity,
        group_id = %group_id,
        ticket = ticket,
        messages = messages,
        "group batch dispatched"
    );
}

/// A ready batch is waiting on the cooldown or an in-flight dispatch.
pub fn dispatch_deferred(identity: &str, group_id: &str, wait_ms: i64, pending: usize) {
    tracing::debug!(
        event = "dispatch_deferred",
        identity = %identity,
        group_id = %group_id,
        wait_ms = wait_ms,
        pending = pending,
        "dispatch deferred"
    );
}

/// Inbound traffic for an AID nobody owns.
pub fn route_dropped(aid: &str, sender: &str) {
    tracing::warn!(
        event = "route_dropped",
        aid = %aid,
        sender = %sender,
        "inbound event dropped: unmapped aid"
    );
}

/// A peer's credit score changed.
pub fn credit_updated(identity: &str, peer: &str, old_score: u8, new_score: u8) {
    tracing::info!(
        event = "credit_updated",
        identity = %identity,
        peer = %peer,
        old_score = old_score,
        new_score = new_score,
        "credit updated"
    );
}

/// A store read or write failed; in-memory state keeps operating.
pub fn persistence_degraded(store: &str, error: &str) {
    tracing::warn!(
        event = "persistence_degraded",
        store = %store,
        error = %error,
        "persistence degraded"
    );
}

/// A store write succeeded after an earlier failure.
pub fn persistence_recovered(store: &str) {
    tracing::info!(
        event = "persistence_recovered",
        store = %store,
        "persistence recovered"
    );
}

/// The transport reported a status change for an identity.
pub fn identity_status_changed(identity: &str, status: &str, detail: Option<&str>) {
    tracing::info!(
        event = "identity_status_changed",
        identity = %identity,
        status = %status,
        detail = detail.unwrap_or(""),
        "identity status changed"
    );
}
