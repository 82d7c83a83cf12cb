//! Reputation records and session outcome types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Aid, CloseReason};
use crate::constants::CREDIT_BASE;

/// Durable per-peer reputation record. One per peer AID per identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub aid: Aid,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub interaction_count: u64,
    #[serde(default)]
    pub total_duration_ms: u64,
    #[serde(default)]
    pub successful_sessions: u64,
    #[serde(default)]
    pub failed_sessions: u64,
    /// Stored score in `[0, 100]`. Shadowed by `manual_override` when set.
    pub credit_score: u8,
    #[serde(default)]
    pub manual_override: Option<u8>,
    #[serde(default)]
    pub override_reason: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    #[serde(default)]
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(aid: Aid, now: DateTime<Utc>) -> Self {
        Self {
            aid,
            display_name: None,
            groups: BTreeSet::new(),
            interaction_count: 0,
            total_duration_ms: 0,
            successful_sessions: 0,
            failed_sessions: 0,
            credit_score: CREDIT_BASE,
            manual_override: None,
            override_reason: None,
            first_seen_at: now,
            last_interaction_at: None,
            updated_at: now,
        }
    }
}

/// Structured quality rating returned by the dispatcher, each axis 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiRating {
    pub relevance: u8,
    pub cooperation: u8,
    pub value: u8,
}

impl AiRating {
    /// Mean of the three axes.
    pub fn average(&self) -> f64 {
        (self.relevance as f64 + self.cooperation as f64 + self.value as f64) / 3.0
    }
}

/// Score of one finished session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionScore {
    pub rule_score: u8,
    pub ai_rating: Option<AiRating>,
    pub final_score: u8,
}

/// One scored session, folded into the ledger as a single observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: String,
    pub peer: Aid,
    pub turns: u32,
    pub duration_ms: u64,
    pub close_reason: CloseReason,
    pub score: SessionScore,
}

/// Summary statistics retained after a session ends. No transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub peer: Aid,
    pub is_owner: bool,
    pub turns: u32,
    pub duration_ms: u64,
    pub close_reason: CloseReason,
    pub rule_score: u8,
    #[serde(default)]
    pub ai_score: Option<u8>,
    pub final_score: u8,
    pub closed_at: DateTime<Utc>,
}
