//! Configuration for peer reputation and session scoring.
//!
//! # Examples
//!
//! ```
//! use parley_core::config::{CreditConfig, ScoringConfig};
//!
//! let credit = CreditConfig::default();
//! assert_eq!(credit.reject_below, 20);
//!
//! let scoring = ScoringConfig::default();
//! assert!((scoring.rule_weight - 0.6).abs() < f64::EPSILON);
//! ```

use serde::{Deserialize, Serialize};

use super::defaults;

/// Reputation ledger thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditConfig {
    /// Peers with a credit score strictly below this are flagged. Default: 20.
    pub reject_below: u8,
    /// Final session scores at or above this count as successful. Default: 50.
    pub success_threshold: u8,
    /// Weight given to the history score when folding in a session. Default: 0.7.
    pub history_weight: f64,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            reject_below: defaults::DEFAULT_REJECT_BELOW,
            success_threshold: defaults::DEFAULT_SUCCESS_THRESHOLD,
            history_weight: defaults::DEFAULT_HISTORY_WEIGHT,
        }
    }
}

/// Session outcome scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Ask the dispatcher for a structured quality rating. Default: true.
    pub ai_refinement: bool,
    /// Deadline for the quality rating. Default: 8s.
    pub ai_timeout_ms: u64,
    /// Weight of the rule score when an AI rating is available. Default: 0.6.
    pub rule_weight: f64,
    /// Turn count at which engagement saturates. Default: 10.
    pub engagement_turn_cap: u32,
    /// Session summaries retained per identity. Default: 500.
    pub summary_history: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ai_refinement: defaults::DEFAULT_AI_REFINEMENT,
            ai_timeout_ms: defaults::DEFAULT_AI_TIMEOUT_MS,
            rule_weight: defaults::DEFAULT_RULE_WEIGHT,
            engagement_turn_cap: defaults::DEFAULT_ENGAGEMENT_TURN_CAP,
            summary_history: defaults::DEFAULT_SUMMARY_HISTORY,
        }
    }
}
