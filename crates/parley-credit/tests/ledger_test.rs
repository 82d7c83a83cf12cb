use std::sync::Arc;

use parley_core::config::CreditConfig;
use parley_core::models::{Aid, CloseReason, Contact, SessionOutcome, SessionScore};
use parley_core::traits::SnapshotStore;
use parley_credit::{calculate_credit_score, ContactBook};
use test_fixtures::{aid, at_ms, contact, t0, FlakyStore};

fn book_with(store: Arc<FlakyStore<Contact>>) -> ContactBook {
    ContactBook::open("main", &CreditConfig::default(), store)
}

fn outcome(peer: &str, final_score: u8, duration_ms: u64) -> SessionOutcome {
    SessionOutcome {
        session_id: "s-1".into(),
        peer: Aid::from(peer),
        turns: 4,
        duration_ms,
        close_reason: CloseReason::EndMarker,
        score: SessionScore {
            rule_score: final_score,
            ai_rating: None,
            final_score,
        },
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

#[test]
fn unknown_peer_is_neutral_and_not_rejected() {
    let book = book_with(Arc::new(FlakyStore::new()));
    assert_eq!(book.credit_of(&aid("stranger.example")), 50);
    assert!(!book.should_reject_by_credit(&aid("stranger.example")));
    assert!(book.get(&aid("stranger.example")).is_none());
}

#[test]
fn override_takes_precedence_and_can_be_cleared() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    let peer = aid("spam.example");
    book.set_manual_override(&peer, 5, Some("spammer"), t0());
    assert_eq!(book.credit_of(&peer), 5);
    assert!(book.should_reject_by_credit(&peer));
    assert_eq!(
        book.get(&peer).unwrap().override_reason.as_deref(),
        Some("spammer")
    );

    assert!(book.clear_manual_override(&peer, t0()));
    assert!(!book.clear_manual_override(&peer, t0()));
    assert_eq!(book.credit_of(&peer), 50);
}

#[test]
fn override_above_range_is_clamped() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    book.set_manual_override(&aid("vip.example"), 250, None, t0());
    assert_eq!(book.credit_of(&aid("vip.example")), 100);
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[test]
fn session_outcome_folds_into_history_score() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    let peer = aid("peer.example");
    for _ in 0..10 {
        book.record_interaction(&peer, t0());
    }
    // history: 50 + 10 + 3 (minutes) + 3 (one success) = 66
    // merged: round(66 * 0.7 + 90 * 0.3) = round(73.2) = 73
    let new_score = book.record_session_outcome(&outcome("peer.example", 90, 180_000), at_ms(1));
    assert_eq!(new_score, 73);

    let c = book.get(&peer).unwrap();
    assert_eq!(c.successful_sessions, 1);
    assert_eq!(c.failed_sessions, 0);
    assert_eq!(c.total_duration_ms, 180_000);
    assert_eq!(c.interaction_count, 10);
    assert_eq!(c.last_interaction_at, Some(at_ms(1)));
}

#[test]
fn low_session_score_counts_as_failure() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    book.record_session_outcome(&outcome("peer.example", 30, 0), t0());
    let c = book.get(&aid("peer.example")).unwrap();
    assert_eq!(c.failed_sessions, 1);
    // history 50 - 3 = 47, merged round(47 * 0.7 + 30 * 0.3) = round(41.9) = 42
    assert_eq!(c.credit_score, 42);
}

#[test]
fn repeated_bad_sessions_reach_rejection() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    let peer = aid("bad.example");
    book.record_interaction(&peer, t0());
    let mut scores = Vec::new();
    for _ in 0..10 {
        scores.push(book.record_session_outcome(&outcome("bad.example", 0, 0), t0()));
    }
    // Each failure costs 3 until the balance cap, then only the fold applies.
    assert_eq!(scores, vec![34, 22, 13, 7, 3, 2, 1, 1, 1, 1]);
    assert!(book.should_reject_by_credit(&peer));

    let strict = CreditConfig {
        reject_below: 40,
        ..Default::default()
    };
    let mut strict_book = ContactBook::open("main", &strict, Arc::new(FlakyStore::new()));
    // round(47 * 0.7) = 33
    strict_book.record_session_outcome(&outcome("bad.example", 0, 0), t0());
    assert_eq!(strict_book.credit_of(&peer), 33);
    assert!(strict_book.should_reject_by_credit(&peer));
}

#[test]
fn interactions_raise_credit_without_any_outcome() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    let peer = aid("chatty.example");
    for _ in 0..10 {
        book.record_interaction(&peer, t0());
    }
    assert_eq!(book.credit_of(&peer), 60);
    assert_eq!(
        book.credit_of(&peer),
        calculate_credit_score(book.get(&peer).unwrap())
    );
}

#[test]
fn interaction_bonus_stops_at_cap() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    let peer = aid("chatty.example");
    for _ in 0..30 {
        book.record_interaction(&peer, t0());
    }
    assert_eq!(book.credit_of(&peer), 70);
}

#[test]
fn outcomes_accumulate_across_sessions() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    let peer = aid("steady.example");
    // 50 -> counters 53 -> round(53 * 0.7 + 100 * 0.3) = 67
    let first = book.record_session_outcome(&outcome("steady.example", 100, 0), t0());
    assert_eq!(first, 67);
    // 67 -> counters 70 -> round(70 * 0.7 + 100 * 0.3) = 79
    let second = book.record_session_outcome(&outcome("steady.example", 100, 0), t0());
    assert_eq!(second, 79);
    // Later interactions keep the folded history.
    book.record_interaction(&peer, t0());
    assert_eq!(book.credit_of(&peer), 80);
}

// ---------------------------------------------------------------------------
// Group membership
// ---------------------------------------------------------------------------

#[test]
fn observe_peer_tracks_names_and_groups() {
    let mut book = book_with(Arc::new(FlakyStore::new()));
    let peer = aid("bob.example");
    book.observe_peer(&peer, Some("Bob"), Some("g1"), t0());
    book.observe_peer(&peer, None, Some("g2"), t0());
    let c = book.get(&peer).unwrap();
    assert_eq!(c.display_name.as_deref(), Some("Bob"));
    assert_eq!(c.groups.len(), 2);

    book.forget_group("g1", t0());
    assert_eq!(
        book.get(&peer).unwrap().groups.iter().collect::<Vec<_>>(),
        vec!["g2"]
    );
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn book_reloads_from_store() {
    let store = Arc::new(FlakyStore::new());
    {
        let mut book = book_with(store.clone());
        book.record_interaction(&aid("a.example"), t0());
        book.set_manual_override(&aid("b.example"), 90, None, t0());
    }
    let book = book_with(store);
    assert_eq!(book.len(), 2);
    assert_eq!(book.credit_of(&aid("b.example")), 90);
    assert_eq!(book.list()[0].aid.as_str(), "a.example");
}

#[test]
fn corrupt_store_opens_empty() {
    let book = ContactBook::open(
        "main",
        &CreditConfig::default(),
        Arc::new(FlakyStore::<Contact>::corrupt()),
    );
    assert!(book.is_empty());
}

#[test]
fn failed_save_marks_dirty_and_next_save_heals() {
    let store = Arc::new(FlakyStore::new());
    let mut book = book_with(store.clone());

    store.set_fail_saves(true);
    book.record_interaction(&aid("a.example"), t0());
    assert!(book.is_dirty());
    // In-memory state keeps operating.
    assert_eq!(book.get(&aid("a.example")).unwrap().interaction_count, 1);
    assert!(store.items().is_empty());

    store.set_fail_saves(false);
    book.record_interaction(&aid("b.example"), t0());
    assert!(!book.is_dirty());
    assert_eq!(store.load_all().unwrap().len(), 2);
}

#[test]
fn seeded_store_contact_credit_is_preserved() {
    let store = Arc::new(FlakyStore::new());
    let mut seeded = contact("old.example");
    seeded.credit_score = 88;
    store.save_all(&[seeded]).unwrap();
    let book = book_with(store);
    assert_eq!(book.credit_of(&aid("old.example")), 88);
}
