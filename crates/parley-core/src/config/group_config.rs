use serde::{Deserialize, Serialize};

use super::defaults;

/// Buffering, cooldown, and reply shaping for group chats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Aggregation window of the buffer gate.
    pub group_buffer_gate_ms: u64,
    /// Minimum spacing between two dispatches for the same group.
    pub group_dispatch_cooldown_ms: u64,
    /// Rolling window used for vitality classification.
    pub vitality_window_ms: u64,
    /// Shortened aggregation window once the identity is mentioned.
    pub mention_delay_ms: u64,
    /// Hard character budget for any group reply.
    pub max_reply_chars: usize,
    /// Character budget for reaction replies.
    pub reaction_max_chars: usize,
    /// Seen-id set size before pruning below the watermark.
    pub seen_ids_capacity: usize,
    /// How many recent reply hashes are kept for repetition avoidance.
    pub recent_reply_hashes: usize,
    /// Deadline handed to the dispatcher for a group reply.
    pub reply_timeout_ms: u64,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            group_buffer_gate_ms: defaults::DEFAULT_GROUP_BUFFER_GATE_MS,
            group_dispatch_cooldown_ms: defaults::DEFAULT_GROUP_DISPATCH_COOLDOWN_MS,
            vitality_window_ms: defaults::DEFAULT_VITALITY_WINDOW_MS,
            mention_delay_ms: defaults::DEFAULT_MENTION_DELAY_MS,
            max_reply_chars: defaults::DEFAULT_MAX_REPLY_CHARS,
            reaction_max_chars: defaults::DEFAULT_REACTION_MAX_CHARS,
            seen_ids_capacity: defaults::DEFAULT_SEEN_IDS_CAPACITY,
            recent_reply_hashes: defaults::DEFAULT_RECENT_REPLY_HASHES,
            reply_timeout_ms: defaults::DEFAULT_REPLY_TIMEOUT_MS,
        }
    }
}
