//! # parley-credit
//!
//! Reputation ledger (one `ContactBook` per identity), the rule-based session
//! scorer with optional dispatcher-rated refinement, and the bounded
//! session-summary log.

pub mod formula;
pub mod ledger;
pub mod outcome;
pub mod rating;
pub mod summary;

pub use formula::{calculate_credit_score, history_score, merge_credit, merge_session_score};
pub use ledger::ContactBook;
pub use outcome::SessionScorer;
pub use rating::{parse_rating, rating_prompt};
pub use summary::SummaryLog;
