use serde::{Deserialize, Serialize};

/// Per-group pipeline counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub messages_accepted: u64,
    pub duplicates_dropped: u64,
    pub batches_dispatched: u64,
    pub dispatches_deferred: u64,
    pub replies_sent: u64,
    /// Replies withheld as repeats or empty after post-processing.
    pub replies_suppressed: u64,
    pub pulls_rejected: u64,
}

impl GroupMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean messages per dispatched batch.
    pub fn avg_batch_size(&self) -> f64 {
        if self.batches_dispatched == 0 {
            return 0.0;
        }
        self.messages_accepted as f64 / self.batches_dispatched as f64
    }
}
