//! Per-identity reputation ledger.
//!
//! A contact's stored `credit_score` starts at the history formula and
//! follows it: every counter change moves the score by the change in the
//! formula. Session outcomes are then folded into the stored score, so they
//! accumulate instead of being recomputed away. `credit_of` is the override
//! if one is set, else the stored score.
//!
//! Every mutation is followed by a full save. A failed save leaves the
//! in-memory book authoritative and marks it dirty; the next successful save
//! clears the flag.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parley_core::config::CreditConfig;
use parley_core::constants::{CREDIT_BASE, CREDIT_MAX, CREDIT_MIN};
use parley_core::models::{Aid, Contact, SessionOutcome};
use parley_core::traits::SnapshotStore;
use parley_observability::events;
use tracing::debug;

use crate::formula::{history_score, merge_credit};

pub struct ContactBook {
    identity_id: String,
    config: CreditConfig,
    contacts: BTreeMap<Aid, Contact>,
    store: Arc<dyn SnapshotStore<Contact>>,
    dirty: bool,
}

impl ContactBook {
    /// Load the book from `store`. A missing or unreadable store starts empty.
    pub fn open(
        identity_id: &str,
        config: &CreditConfig,
        store: Arc<dyn SnapshotStore<Contact>>,
    ) -> Self {
        let contacts = match store.load_all() {
            Ok(list) => list.into_iter().map(|c| (c.aid.clone(), c)).collect(),
            Err(e) => {
                events::persistence_degraded(&format!("{identity_id}/contacts"), &e.to_string());
                BTreeMap::new()
            }
        };
        debug!(identity = %identity_id, contacts = contacts.len(), "contact book opened");
        Self {
            identity_id: identity_id.to_string(),
            config: config.clone(),
            contacts,
            store,
            dirty: false,
        }
    }

    /// Register or touch a peer, optionally recording its display name and a
    /// group it was seen in.
    pub fn observe_peer(
        &mut self,
        aid: &Aid,
        display_name: Option<&str>,
        group_id: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let mut changed = !self.contacts.contains_key(aid);
        let contact = self.entry(aid, now);
        if let Some(name) = display_name.filter(|n| !n.is_empty()) {
            if contact.display_name.as_deref() != Some(name) {
                contact.display_name = Some(name.to_string());
                changed = true;
            }
        }
        if let Some(group) = group_id {
            changed |= contact.groups.insert(group.to_string());
        }
        if changed {
            contact.updated_at = now;
            self.persist();
        }
    }

    /// Drop a group from every contact's memberships.
    pub fn forget_group(&mut self, group_id: &str, now: DateTime<Utc>) {
        let mut changed = false;
        for contact in self.contacts.values_mut() {
            if contact.groups.remove(group_id) {
                contact.updated_at = now;
                changed = true;
            }
        }
        if changed {
            self.persist();
        }
    }

    /// Count one interaction (a newly opened session) with `aid`.
    pub fn record_interaction(&mut self, aid: &Aid, now: DateTime<Utc>) {
        let contact = self.entry(aid, now);
        update_counters(contact, |c| c.interaction_count += 1);
        contact.last_interaction_at = Some(now);
        contact.updated_at = now;
        self.persist();
    }

    /// Fold a scored session into the peer's record. Returns the new stored score.
    pub fn record_session_outcome(&mut self, outcome: &SessionOutcome, now: DateTime<Utc>) -> u8 {
        let success_threshold = self.config.success_threshold;
        let history_weight = self.config.history_weight;
        let contact = self.entry(&outcome.peer, now);

        let old_score = contact.credit_score;
        update_counters(contact, |c| {
            c.total_duration_ms = c.total_duration_ms.saturating_add(outcome.duration_ms);
            if outcome.score.final_score >= success_threshold {
                c.successful_sessions += 1;
            } else {
                c.failed_sessions += 1;
            }
        });
        contact.last_interaction_at = Some(now);
        contact.updated_at = now;

        let new_score = merge_credit(contact.credit_score, outcome.score.final_score, history_weight);
        contact.credit_score = new_score;

        events::credit_updated(&self.identity_id, outcome.peer.as_str(), old_score, new_score);
        self.persist();
        new_score
    }

    /// Pin a peer's credit. Values above 100 are clamped.
    pub fn set_manual_override(
        &mut self,
        aid: &Aid,
        score: u8,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let contact = self.entry(aid, now);
        contact.manual_override = Some(score.min(CREDIT_MAX));
        contact.override_reason = reason.map(str::to_string);
        contact.updated_at = now;
        self.persist();
    }

    /// Remove a manual override. Returns whether one was set.
    pub fn clear_manual_override(&mut self, aid: &Aid, now: DateTime<Utc>) -> bool {
        let Some(contact) = self.contacts.get_mut(aid) else {
            return false;
        };
        if contact.manual_override.take().is_none() {
            return false;
        }
        contact.override_reason = None;
        contact.updated_at = now;
        self.persist();
        true
    }

    /// Effective credit: override verbatim, else the stored score. Unknown peers
    /// are neutral.
    pub fn credit_of(&self, aid: &Aid) -> u8 {
        match self.contacts.get(aid) {
            Some(c) => c.manual_override.unwrap_or(c.credit_score),
            None => CREDIT_BASE,
        }
    }

    /// Advisory: the admission path decides what to do with it.
    pub fn should_reject_by_credit(&self, aid: &Aid) -> bool {
        self.credit_of(aid) < self.config.reject_below
    }

    pub fn get(&self, aid: &Aid) -> Option<&Contact> {
        self.contacts.get(aid)
    }

    /// All contacts ordered by AID.
    pub fn list(&self) -> Vec<&Contact> {
        self.contacts.values().collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// True while the last save failed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Retry a failed save.
    pub fn flush(&mut self) {
        self.persist();
    }

    fn entry(&mut self, aid: &Aid, now: DateTime<Utc>) -> &mut Contact {
        self.contacts
            .entry(aid.clone())
            .or_insert_with(|| Contact::new(aid.clone(), now))
    }

    fn persist(&mut self) {
        let snapshot: Vec<Contact> = self.contacts.values().cloned().collect();
        let store_name = format!("{}/contacts", self.identity_id);
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
}

/// Apply a counter change and shift the stored score by the formula delta.
fn update_counters(contact: &mut Contact, change: impl FnOnce(&mut Contact)) {
    let before = history_score(contact) as i16;
    change(contact);
    let after = history_score(contact) as i16;
    let shifted = contact.credit_score as i16 + (after - before);
    contact.credit_score = shifted.clamp(CREDIT_MIN as i16, CREDIT_MAX as i16) as u8;
}

impl std::fmt::Debug for ContactBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactBook")
            .field("identity_id", &self.identity_id)
            .field("contacts", &self.contacts.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}
