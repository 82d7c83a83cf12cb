//! Credit formulas.
//!
//! History score: `50 + min(interactions, 20) + min(minutes, 15)
//! + clamp((successes - failures) * 3, -15, 15)`, clamped to `[0, 100]`.
//! A manual override replaces the whole computation.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use parley_core::models::{Aid, Contact};
//! use parley_credit::calculate_credit_score;
//!
//! let mut contact = Contact::new(Aid::from("peer.example"), Utc::now());
//! contact.interaction_count = 10;
//! assert_eq!(calculate_credit_score(&contact), 60);
//! ```

use parley_core::constants::{CREDIT_BASE, CREDIT_MAX, CREDIT_MIN};
use parley_core::models::{AiRating, Contact};

const INTERACTION_BONUS_CAP: u64 = 20;
const DURATION_BONUS_CAP: u64 = 15;
const OUTCOME_BALANCE_STEP: i64 = 3;
const OUTCOME_BALANCE_CAP: i64 = 15;

fn clamp_score(value: f64) -> u8 {
    value.round().clamp(CREDIT_MIN as f64, CREDIT_MAX as f64) as u8
}

/// Deterministic history score of a contact. The override is returned verbatim.
pub fn calculate_credit_score(contact: &Contact) -> u8 {
    match contact.manual_override {
        Some(manual) => manual,
        None => history_score(contact),
    }
}

/// The counter-based formula alone, ignoring any override.
pub fn history_score(contact: &Contact) -> u8 {
    let interactions = contact.interaction_count.min(INTERACTION_BONUS_CAP) as i64;
    let minutes = (contact.total_duration_ms / 60_000).min(DURATION_BONUS_CAP) as i64;
    let balance = (contact.successful_sessions as i64 - contact.failed_sessions as i64)
        .saturating_mul(OUTCOME_BALANCE_STEP)
        .clamp(-OUTCOME_BALANCE_CAP, OUTCOME_BALANCE_CAP);

    let raw = CREDIT_BASE as i64 + interactions + minutes + balance;
    raw.clamp(CREDIT_MIN as i64, CREDIT_MAX as i64) as u8
}

/// Fold one session score into the history score:
/// `round(old * history_weight + session * (1 - history_weight))`.
pub fn merge_credit(old_score: u8, session_score: u8, history_weight: f64) -> u8 {
    let w = history_weight.clamp(0.0, 1.0);
    clamp_score(old_score as f64 * w + session_score as f64 * (1.0 - w))
}

/// Combine the rule score with an optional dispatcher rating.
/// Without a rating the rule score is returned unchanged.
pub fn merge_session_score(rule_score: u8, rating: Option<&AiRating>, rule_weight: f64) -> u8 {
    match rating {
        None => rule_score,
        Some(rating) => {
            let w = rule_weight.clamp(0.0, 1.0);
            clamp_score(rule_score as f64 * w + rating.average() * (1.0 - w))
        }
    }
}
