use parley_core::config::SessionConfig;
use parley_core::errors::SessionError;
use parley_core::models::{CloseReason, SessionStatus};
use parley_session::SessionManager;
use test_fixtures::{aid, at_ms, t0};

fn manager(config: SessionConfig) -> SessionManager {
    SessionManager::new("main", &config)
}

fn defaults() -> SessionConfig {
    SessionConfig::default()
}

// ---------------------------------------------------------------------------
// Admission and resolution
// ---------------------------------------------------------------------------

#[test]
fn first_inbound_opens_session_and_counts_turn() {
    let mut m = manager(defaults());
    let out = m.on_inbound(&aid("bob"), Some("s-1"), "hello", t0()).unwrap();
    assert!(out.opened);
    assert!(out.wants_reply());
    assert_eq!(out.session_id, "s-1");
    let snap = m.get("s-1").unwrap();
    assert_eq!(snap.turns, 1);
    assert_eq!(snap.status, SessionStatus::Active);
    assert!(!snap.is_owner);
}

#[test]
fn inbound_without_key_continues_latest_session() {
    let mut m = manager(defaults());
    let first = m.on_inbound(&aid("bob"), None, "hi", t0()).unwrap();
    let second = m.on_inbound(&aid("bob"), None, "again", at_ms(10)).unwrap();
    assert!(!second.opened);
    assert_eq!(first.session_id, second.session_id);
    assert_eq!(m.get(&first.session_id).unwrap().turns, 2);
}

#[test]
fn generated_ids_are_uuids() {
    let mut m = manager(defaults());
    let out = m.on_inbound(&aid("bob"), None, "hi", t0()).unwrap();
    assert_eq!(out.session_id.len(), 36);
}

#[test]
fn reused_key_from_another_target_is_rejected() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("bob"), Some("s-1"), "hi", t0()).unwrap();
    let err = m.on_inbound(&aid("eve"), Some("s-1"), "hi", t0()).unwrap_err();
    assert!(matches!(err, SessionError::TargetMismatch { .. }));
    assert_eq!(m.get("s-1").unwrap().turns, 1);
}

// ---------------------------------------------------------------------------
// Concurrency bound
// ---------------------------------------------------------------------------

#[test]
fn global_bound_evicts_least_recently_active() {
    let mut m = manager(SessionConfig {
        max_concurrent_sessions: 3,
        max_sessions_per_target: 1,
        ..defaults()
    });
    m.on_inbound(&aid("a"), Some("s-a"), "x", at_ms(0)).unwrap();
    m.on_inbound(&aid("b"), Some("s-b"), "x", at_ms(10)).unwrap();
    m.on_inbound(&aid("c"), Some("s-c"), "x", at_ms(20)).unwrap();
    // Touch a so b becomes least recently active.
    m.on_inbound(&aid("a"), Some("s-a"), "y", at_ms(30)).unwrap();

    let out = m.on_inbound(&aid("d"), Some("s-d"), "x", at_ms(40)).unwrap();
    assert_eq!(out.evicted.len(), 1);
    assert_eq!(out.evicted[0].session.session_id, "s-b");
    assert_eq!(out.evicted[0].reason, CloseReason::LruEvicted);
    assert_eq!(out.evicted[0].session.close_reason, Some(CloseReason::LruEvicted));
    assert_eq!(m.len(), 3);
    assert!(m.get("s-b").is_none());
}

#[test]
fn per_target_bound_is_evaluated_first() {
    let mut m = manager(SessionConfig {
        max_concurrent_sessions: 10,
        max_sessions_per_target: 2,
        ..defaults()
    });
    m.on_inbound(&aid("other"), Some("o-1"), "x", at_ms(0)).unwrap();
    m.on_inbound(&aid("bob"), Some("b-1"), "x", at_ms(10)).unwrap();
    m.on_inbound(&aid("bob"), Some("b-2"), "x", at_ms(20)).unwrap();

    let out = m.on_inbound(&aid("bob"), Some("b-3"), "x", at_ms(30)).unwrap();
    // The globally oldest session belongs to another target and survives.
    assert_eq!(out.evicted.len(), 1);
    assert_eq!(out.evicted[0].session.session_id, "b-1");
    assert!(m.get("o-1").is_some());
    assert_eq!(m.count_for(&aid("bob")), 2);
}

// ---------------------------------------------------------------------------
// Soft and protocol layers
// ---------------------------------------------------------------------------

#[test]
fn end_marker_in_reply_closes_and_sends_reply() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("bob"), Some("s-1"), "question", t0()).unwrap();
    let out = m.on_outbound("s-1", "answer, goodbye [END]", at_ms(5)).unwrap();
    assert_eq!(out.send.as_deref(), Some("answer, goodbye [END]"));
    let closed = out.closed.unwrap();
    assert_eq!(closed.reason, CloseReason::EndMarker);
    assert_eq!(closed.session.status, SessionStatus::Closed);
    assert!(m.is_empty());
}

#[test]
fn peer_end_marker_closes_with_acknowledgement() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("bob"), Some("s-1"), "hi", t0()).unwrap();
    let out = m.on_inbound(&aid("bob"), Some("s-1"), "thanks [END]", at_ms(5)).unwrap();
    assert!(!out.wants_reply());
    assert_eq!(out.closed.unwrap().reason, CloseReason::PeerEnded);
    assert_eq!(out.farewell.as_deref(), Some("[END]"));
}

#[test]
fn peer_end_without_acknowledgement() {
    let mut m = manager(SessionConfig {
        acknowledge_peer_end: false,
        ..defaults()
    });
    let out = m.on_inbound(&aid("bob"), Some("s-1"), "[END]", t0()).unwrap();
    assert_eq!(out.closed.unwrap().reason, CloseReason::PeerEnded);
    assert!(out.farewell.is_none());
}

#[test]
fn consecutive_empty_replies_close_session() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("bob"), Some("s-1"), "hi", t0()).unwrap();
    let first = m.on_outbound("s-1", "   ", at_ms(1)).unwrap();
    assert!(first.send.is_none());
    assert!(first.closed.is_none());

    let second = m.on_outbound("s-1", "", at_ms(2)).unwrap();
    assert_eq!(second.closed.unwrap().reason, CloseReason::EmptyReplies);
    assert_eq!(second.send.as_deref(), Some("[END]"));
}

#[test]
fn non_empty_message_resets_empty_streak() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("bob"), Some("s-1"), "hi", t0()).unwrap();
    m.on_outbound("s-1", "", at_ms(1)).unwrap();
    m.on_inbound(&aid("bob"), Some("s-1"), "still there?", at_ms(2)).unwrap();
    let out = m.on_outbound("s-1", "", at_ms(3)).unwrap();
    assert!(out.closed.is_none());
    assert_eq!(m.get("s-1").unwrap().consecutive_empty_replies, 1);
}

#[test]
fn empty_inbound_messages_count_toward_the_streak() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("bob"), Some("s-1"), "", t0()).unwrap();
    let out = m.on_inbound(&aid("bob"), Some("s-1"), " ", at_ms(1)).unwrap();
    assert_eq!(out.closed.unwrap().reason, CloseReason::EmptyReplies);
}

// ---------------------------------------------------------------------------
// Hard limits
// ---------------------------------------------------------------------------

#[test]
fn max_turns_closes_on_arrival() {
    let mut m = manager(SessionConfig {
        max_turns: 2,
        ..defaults()
    });
    m.on_inbound(&aid("bob"), Some("s-1"), "one", t0()).unwrap();
    let out = m.on_inbound(&aid("bob"), Some("s-1"), "two", at_ms(1)).unwrap();
    let closed = out.closed.unwrap();
    assert_eq!(closed.reason, CloseReason::MaxTurns);
    assert_eq!(closed.session.turns, 2);
    assert_eq!(out.farewell.as_deref(), Some("[END]"));
}

#[test]
fn idle_session_closes_at_or_after_timeout() {
    let mut m = manager(SessionConfig {
        idle_timeout_ms: 1_000,
        ..defaults()
    });
    m.on_inbound(&aid("bob"), Some("s-1"), "hi", t0()).unwrap();
    assert!(m.sweep(at_ms(999)).is_empty());
    let closed = m.sweep(at_ms(1_000));
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].reason, CloseReason::IdleTimeout);
    assert_eq!(closed[0].closed_at, at_ms(1_000));
    // Handed out exactly once.
    assert!(m.sweep(at_ms(5_000)).is_empty());
}

#[test]
fn long_session_closes_on_duration_even_when_busy() {
    let mut m = manager(SessionConfig {
        max_duration_ms: 10_000,
        idle_timeout_ms: 5_000,
        ..defaults()
    });
    for i in 0..4 {
        m.on_inbound(&aid("bob"), Some("s-1"), "tick", at_ms(i * 3_000)).unwrap();
    }
    let out = m.on_outbound("s-1", "reply", at_ms(10_500)).unwrap();
    assert_eq!(out.closed.unwrap().reason, CloseReason::MaxDuration);
    assert_eq!(out.send.as_deref(), Some("reply [END]"));
}

#[test]
fn marker_is_not_appended_when_disabled() {
    let mut m = manager(SessionConfig {
        max_duration_ms: 1_000,
        append_end_marker_on_close: false,
        ..defaults()
    });
    m.on_inbound(&aid("bob"), Some("s-1"), "hi", t0()).unwrap();
    let out = m.on_outbound("s-1", "late reply", at_ms(2_000)).unwrap();
    assert_eq!(out.send.as_deref(), Some("late reply"));
}

// ---------------------------------------------------------------------------
// Outbound initiation and forced closes
// ---------------------------------------------------------------------------

#[test]
fn start_outbound_supersedes_open_sessions_with_target() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("bob"), Some("s-1"), "hi", t0()).unwrap();
    m.on_inbound(&aid("eve"), Some("s-2"), "hi", t0()).unwrap();

    let start = m.start_outbound(&aid("bob"), at_ms(10));
    assert_eq!(start.superseded.len(), 1);
    assert_eq!(start.superseded[0].reason, CloseReason::Superseded);
    assert!(start.evicted.is_empty());
    let snap = m.get(&start.session_id).unwrap();
    assert!(snap.is_owner);
    assert_eq!(snap.turns, 0);
    assert!(m.get("s-2").is_some());
}

#[test]
fn outbound_on_unknown_session_is_not_found() {
    let mut m = manager(defaults());
    let err = m.on_outbound("missing", "hi", t0()).unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
}

#[test]
fn close_all_hands_out_every_session_once() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("a"), Some("s-a"), "x", t0()).unwrap();
    m.on_inbound(&aid("b"), Some("s-b"), "x", t0()).unwrap();
    let closed = m.close_all(CloseReason::Forced, at_ms(1));
    assert_eq!(closed.len(), 2);
    assert!(closed.iter().all(|c| c.reason == CloseReason::Forced));
    assert!(m.close_all(CloseReason::Forced, at_ms(2)).is_empty());
    assert!(m.close("s-a", CloseReason::Forced, at_ms(3)).is_none());
}

#[test]
fn closed_session_keeps_transcript_tail() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("bob"), Some("s-1"), "question", t0()).unwrap();
    m.on_outbound("s-1", "answer", at_ms(1)).unwrap();
    let closed = m.close("s-1", CloseReason::Forced, at_ms(2)).unwrap();
    assert_eq!(closed.transcript.len(), 2);
    assert!(closed.transcript[0].from_peer);
    assert_eq!(closed.transcript[1].content, "answer");
}

#[test]
fn snapshot_is_ordered_by_creation() {
    let mut m = manager(defaults());
    m.on_inbound(&aid("b"), Some("s-b"), "x", at_ms(5)).unwrap();
    m.on_inbound(&aid("a"), Some("s-a"), "x", at_ms(1)).unwrap();
    let ids: Vec<String> = m.snapshot().into_iter().map(|s| s.session_id).collect();
    assert_eq!(ids, vec!["s-a", "s-b"]);
}
