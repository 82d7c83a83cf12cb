//! Session counts, close-reason distribution, and average duration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const MAX_DURATION_SAMPLES: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    /// Close-reason distribution, keyed by the serialised reason.
    pub closed_by_reason: BTreeMap<String, u64>,
    durations_ms: Vec<u64>,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_opened(&mut self) {
        self.sessions_opened += 1;
    }

    pub fn session_closed(&mut self, reason: &str, duration: Duration) {
        self.sessions_closed += 1;
        *self.closed_by_reason.entry(reason.to_string()).or_default() += 1;
        self.durations_ms.push(duration.as_millis() as u64);
        if self.durations_ms.len() > MAX_DURATION_SAMPLES {
            self.durations_ms
                .drain(..self.durations_ms.len() - MAX_DURATION_SAMPLES);
        }
    }

    /// Sessions opened but not yet closed.
    pub fn active(&self) -> u64 {
        self.sessions_opened.saturating_sub(self.sessions_closed)
    }

    pub fn avg_duration(&self) -> Duration {
        if self.durations_ms.is_empty() {
            return Duration::ZERO;
        }
        let total: u64 = self.durations_ms.iter().sum();
        Duration::from_millis(total / self.durations_ms.len() as u64)
    }
}
