use chrono::{Duration, TimeZone, Utc};
use parley_core::models::*;

#[test]
fn aid_prefix_is_leading_label() {
    assert_eq!(Aid::from("bob.agents.example").prefix(), "bob");
    assert_eq!(Aid::from("plain").prefix(), "plain");
}

#[test]
fn aid_serializes_as_plain_string() {
    let json = serde_json::to_string(&Aid::from("bob.example")).unwrap();
    assert_eq!(json, "\"bob.example\"");
}

#[test]
fn close_reason_serializes_snake_case() {
    let json = serde_json::to_string(&CloseReason::LruEvicted).unwrap();
    assert_eq!(json, "\"lru_evicted\"");
    assert_eq!(CloseReason::IdleTimeout.as_str(), "idle_timeout");
    assert_eq!(CloseReason::PeerEnded.to_string(), "peer_ended");
    let back: CloseReason = serde_json::from_str("\"max_duration\"").unwrap();
    assert_eq!(back, CloseReason::MaxDuration);
}

#[test]
fn vitality_levels_are_ordered_by_activity() {
    assert!(VitalityLevel::Dormant < VitalityLevel::Cooling);
    assert!(VitalityLevel::Active < VitalityLevel::Heated);
    assert_eq!(
        serde_json::to_string(&VitalityLevel::Heated).unwrap(),
        "\"HEATED\""
    );
}

#[test]
fn new_contact_starts_at_base_credit() {
    let now = Utc::now();
    let c = Contact::new(Aid::from("peer.example"), now);
    assert_eq!(c.credit_score, 50);
    assert_eq!(c.interaction_count, 0);
    assert!(c.manual_override.is_none());
    assert_eq!(c.first_seen_at, now);
}

#[test]
fn contact_deserializes_with_missing_optional_fields() {
    let json = r#"{
        "aid": "peer.example",
        "credit_score": 71,
        "first_seen_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-02T00:00:00Z"
    }"#;
    let c: Contact = serde_json::from_str(json).unwrap();
    assert_eq!(c.credit_score, 71);
    assert!(c.groups.is_empty());
    assert_eq!(c.successful_sessions, 0);
}

#[test]
fn ai_rating_average() {
    let r = AiRating {
        relevance: 60,
        cooperation: 70,
        value: 80,
    };
    assert!((r.average() - 70.0).abs() < f64::EPSILON);
}

#[test]
fn closed_session_duration_never_negative() {
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let session = SessionSnapshot {
        session_id: "s".into(),
        target: Aid::from("peer"),
        is_owner: false,
        status: SessionStatus::Closed,
        turns: 3,
        consecutive_empty_replies: 0,
        created_at: created,
        last_activity_at: created,
        closed_at: None,
        close_reason: None,
    };
    let closed = ClosedSession {
        session: session.clone(),
        reason: CloseReason::Forced,
        closed_at: created + Duration::seconds(90),
        transcript: Vec::new(),
    };
    assert_eq!(closed.duration_ms(), 90_000);

    let skewed = ClosedSession {
        session,
        reason: CloseReason::Forced,
        closed_at: created - Duration::seconds(1),
        transcript: Vec::new(),
    };
    assert_eq!(skewed.duration_ms(), 0);
}
