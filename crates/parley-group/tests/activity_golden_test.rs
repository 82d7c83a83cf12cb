//! Golden cases for vitality classification and reply post-processing.

use parley_core::config::GroupConfig;
use parley_core::models::{Aid, VitalityLevel};
use parley_group::{compute_vitality, post_process, ReplyIntensity, VitalityWindow};
use serde::Deserialize;
use test_fixtures::{at_ms, load_fixture};

#[derive(Debug, Deserialize)]
struct VitalityCase {
    name: String,
    events: Vec<(i64, String)>,
    now_ms: i64,
    expected: VitalityLevel,
    message_count: usize,
    speaker_count: usize,
}

#[derive(Debug, Deserialize)]
struct ReplyCase {
    name: String,
    intensity: ReplyIntensity,
    input: String,
    max_reply_chars: usize,
    reaction_max_chars: usize,
    expected: String,
}

const WINDOW_MS: u64 = 300_000;

#[test]
fn vitality_classification_matches_golden() {
    let cases: Vec<VitalityCase> = load_fixture("vitality/classification.json");
    assert!(!cases.is_empty());
    let own = Aid::from("self.example");

    for case in cases {
        let events: Vec<_> = case
            .events
            .iter()
            .map(|(offset, sender)| (at_ms(*offset), Aid::from(sender.as_str())))
            .collect();
        let state = compute_vitality(events.iter(), &own, WINDOW_MS, at_ms(case.now_ms));
        assert_eq!(state.level, case.expected, "{}", case.name);
        assert_eq!(state.message_count, case.message_count, "{}", case.name);
        assert_eq!(state.speaker_count, case.speaker_count, "{}", case.name);
    }
}

#[test]
fn window_pruning_agrees_with_pure_computation() {
    let cases: Vec<VitalityCase> = load_fixture("vitality/classification.json");
    let own = Aid::from("self.example");

    for case in cases {
        let mut window = VitalityWindow::new(WINDOW_MS);
        for (offset, sender) in &case.events {
            window.record(at_ms(*offset), Aid::from(sender.as_str()));
        }
        let now = at_ms(case.now_ms);
        let first = window.compute(&own, now);
        let second = window.compute(&own, now);
        assert_eq!(first, second, "{}: compute must be idempotent", case.name);
        assert_eq!(first.level, case.expected, "{}", case.name);
        assert_eq!(window.len(), case.message_count, "{}", case.name);
    }
}

#[test]
fn post_process_matches_golden() {
    let cases: Vec<ReplyCase> = load_fixture("replies/post_process.json");
    assert!(!cases.is_empty());

    for case in cases {
        let config = GroupConfig {
            max_reply_chars: case.max_reply_chars,
            reaction_max_chars: case.reaction_max_chars,
            ..GroupConfig::default()
        };
        let out = post_process(&case.input, case.intensity, &config);
        assert_eq!(out, case.expected, "{}", case.name);
        assert!(out.chars().count() <= case.max_reply_chars, "{}", case.name);
    }
}
