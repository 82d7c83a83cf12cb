//! Bounded log of finished-session summaries. Statistics only, no transcripts.

use std::collections::VecDeque;
use std::sync::Arc;

use parley_core::models::SessionSummary;
use parley_core::traits::SnapshotStore;
use parley_observability::events;

pub struct SummaryLog {
    identity_id: String,
    capacity: usize,
    entries: VecDeque<SessionSummary>,
    store: Arc<dyn SnapshotStore<SessionSummary>>,
    dirty: bool,
}

impl SummaryLog {
    pub fn open(
        identity_id: &str,
        capacity: usize,
        store: Arc<dyn SnapshotStore<SessionSummary>>,
    ) -> Self {
        let mut entries: VecDeque<SessionSummary> = match store.load_all() {
            Ok(list) => list.into(),
            Err(e) => {
                events::persistence_degraded(&format!("{identity_id}/sessions"), &e.to_string());
                VecDeque::new()
            }
        };
        while entries.len() > capacity {
            entries.pop_front();
        }
        Self {
            identity_id: identity_id.to_string(),
            capacity,
            entries,
            store,
            dirty: false,
        }
    }

    /// Append a summary, evicting the oldest past capacity.
    pub fn push(&mut self, summary: SessionSummary) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(summary);

        let snapshot: Vec<SessionSummary> = self.entries.iter().cloned().collect();
        let store_name = format!("{}/sessions", self.identity_id);
        match self.store.save_all(&snapshot) {
            Ok(()) => {
                if self.dirty {
                    events::persistence_recovered(&store_name);
                }
                self.dirty = false;
            }
            Err(e) => {
                events::persistence_degraded(&store_name, &e.to_string());
                self.dirty = true;
            }
        }
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<SessionSummary> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
