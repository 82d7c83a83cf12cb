//! Group chat types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Aid;

/// A message pulled from a group. `msg_id` increases monotonically per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub msg_id: u64,
    pub group_id: String,
    pub sender: Aid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Activity classification of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VitalityLevel {
    Dormant,
    Cooling,
    Active,
    Heated,
}

/// Vitality derived from the rolling window. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVitalityState {
    pub level: VitalityLevel,
    pub message_count: usize,
    pub speaker_count: usize,
    pub self_message_count: usize,
    pub computed_at: DateTime<Utc>,
}
