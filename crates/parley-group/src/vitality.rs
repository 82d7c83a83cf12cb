//! Vitality classification over a rolling window of `(timestamp, sender)` events.
//!
//! 0 messages → DORMANT; ≤5 messages and ≤2 senders → COOLING;
//! ≤15 messages → ACTIVE; otherwise HEATED.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use parley_core::constants::{ACTIVE_MAX_MESSAGES, COOLING_MAX_MESSAGES, COOLING_MAX_SPEAKERS};
use parley_core::models::{Aid, GroupVitalityState, VitalityLevel};

pub fn classify(message_count: usize, speaker_count: usize) -> VitalityLevel {
    if message_count == 0 {
        VitalityLevel::Dormant
    } else if message_count <= COOLING_MAX_MESSAGES && speaker_count <= COOLING_MAX_SPEAKERS {
        VitalityLevel::Cooling
    } else if message_count <= ACTIVE_MAX_MESSAGES {
        VitalityLevel::Active
    } else {
        VitalityLevel::Heated
    }
}

/// Pure classification of the events inside `[now - window_ms, now]`.
pub fn compute_vitality<'a>(
    events: impl IntoIterator<Item = &'a (DateTime<Utc>, Aid)>,
    own_aid: &Aid,
    window_ms: u64,
    now: DateTime<Utc>,
) -> GroupVitalityState {
    let cutoff = now - Duration::milliseconds(window_ms as i64);
    let mut message_count = 0;
    let mut self_message_count = 0;
    let mut speakers: HashSet<&Aid> = HashSet::new();
    for (at, sender) in events {
        if *at < cutoff || *at > now {
            continue;
        }
        message_count += 1;
        if sender == own_aid {
            self_message_count += 1;
        }
        speakers.insert(sender);
    }
    GroupVitalityState {
        level: classify(message_count, speakers.len()),
        message_count,
        speaker_count: speakers.len(),
        self_message_count,
        computed_at: now,
    }
}

/// Event window owned by one group buffer. Pruned lazily on computation.
#[derive(Debug, Clone)]
pub struct VitalityWindow {
    window_ms: u64,
    events: VecDeque<(DateTime<Utc>, Aid)>,
}

impl VitalityWindow {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            events: VecDeque::new(),
        }
    }

    pub fn record(&mut self, at: DateTime<Utc>, sender: Aid) {
        self.events.push_back((at, sender));
    }

    /// Drop events older than the window. Idempotent for a fixed `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::milliseconds(self.window_ms as i64);
        self.events.retain(|(at, _)| *at >= cutoff);
    }

    pub fn compute(&mut self, own_aid: &Aid, now: DateTime<Utc>) -> GroupVitalityState {
        self.prune(now);
        compute_vitality(self.events.iter(), own_aid, self.window_ms, now)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
