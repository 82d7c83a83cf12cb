use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Wall-clock view anchored to the tokio clock.
///
/// `now()` advances with `tokio::time`, so state machines fed from this
/// clock and timers armed through the scheduler agree on elapsed time, also
/// under a paused test runtime.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    origin_utc: DateTime<Utc>,
    origin: Instant,
}

impl RuntimeClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(origin_utc: DateTime<Utc>) -> Self {
        Self {
            origin_utc,
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().saturating_duration_since(self.origin);
        chrono::Duration::from_std(elapsed)
            .map(|d| self.origin_utc + d)
            .unwrap_or(self.origin_utc)
    }

    /// The tokio instant corresponding to `at`. Past times map to the origin
    /// side of now and fire immediately.
    pub fn instant_for(&self, at: DateTime<Utc>) -> Instant {
        match (at - self.origin_utc).to_std() {
            Ok(offset) => self.origin + offset,
            Err(_) => self.origin,
        }
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}
