//! Per-identity runtime state. Everything an identity owns lives here and
//! is dropped with it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parley_core::config::{AccountConfig, ParleyConfig};
use parley_core::models::{Aid, Connectivity, SessionSnapshot};
use parley_credit::{ContactBook, SummaryLog};
use parley_group::{GroupBuffer, GroupSnapshot, MentionMatcher};
use parley_observability::SessionMetrics;
use parley_session::SessionManager;
use parley_storage::IdentityStores;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

/// One group's buffer plus the guard that keeps pulls from overlapping.
pub struct GroupSlot {
    pub buffer: Mutex<GroupBuffer>,
    pull: Mutex<()>,
    repull: AtomicBool,
}

impl GroupSlot {
    fn new(buffer: GroupBuffer) -> Self {
        Self {
            buffer: Mutex::new(buffer),
            pull: Mutex::new(()),
            repull: AtomicBool::new(false),
        }
    }

    /// Claim the pull slot, or `None` while another pull is running.
    pub fn try_begin_pull(&self) -> Option<MutexGuard<'_, ()>> {
        self.pull.try_lock().ok()
    }

    /// Ask the running pull to go around once more when it finishes.
    pub fn request_repull(&self) {
        self.repull.store(true, Ordering::SeqCst);
    }

    pub fn take_repull(&self) -> bool {
        self.repull.swap(false, Ordering::SeqCst)
    }
}

pub struct IdentityState {
    id: String,
    aid: Aid,
    account: AccountConfig,
    config: ParleyConfig,
    mentions: MentionMatcher,
    stopped: AtomicBool,

    pub sessions: Mutex<SessionManager>,
    pub contacts: Mutex<ContactBook>,
    pub summaries: Mutex<SummaryLog>,
    pub connectivity: Mutex<Connectivity>,
    pub session_metrics: Mutex<SessionMetrics>,
    groups: DashMap<String, Arc<GroupSlot>>,
}

/// Read-only view for status surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct IdentitySnapshot {
    pub id: String,
    pub aid: Aid,
    pub stopped: bool,
    pub connectivity: Connectivity,
    pub sessions: Vec<SessionSnapshot>,
    pub groups: Vec<GroupSnapshot>,
    pub contacts: usize,
    pub session_metrics: SessionMetrics,
}

impl IdentityState {
    pub fn new(account: &AccountConfig, config: &ParleyConfig, stores: IdentityStores) -> Self {
        let aid = Aid::from(account.aid.as_str());
        Self {
            id: account.id.clone(),
            mentions: MentionMatcher::new(&account.name, &aid, &account.aliases),
            sessions: Mutex::new(SessionManager::new(&account.id, &config.session)),
            contacts: Mutex::new(ContactBook::open(&account.id, &config.credit, stores.contacts)),
            summaries: Mutex::new(SummaryLog::open(
                &account.id,
                config.scoring.summary_history,
                stores.summaries,
            )),
            connectivity: Mutex::new(Connectivity::default()),
            session_metrics: Mutex::new(SessionMetrics::new()),
            groups: DashMap::new(),
            stopped: AtomicBool::new(false),
            aid,
            account: account.clone(),
            config: config.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn aid(&self) -> &Aid {
        &self.aid
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Flip to stopped. Returns `false` if it already was.
    pub(crate) fn mark_stopped(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    /// The slot for `group_id`, created on first use.
    pub fn group(&self, group_id: &str) -> Arc<GroupSlot> {
        self.groups
            .entry(group_id.to_string())
            .or_insert_with(|| {
                Arc::new(GroupSlot::new(GroupBuffer::new(
                    self.id.clone(),
                    group_id,
                    self.aid.clone(),
                    self.mentions.clone(),
                    &self.config.group,
                )))
            })
            .clone()
    }

    pub fn existing_group(&self, group_id: &str) -> Option<Arc<GroupSlot>> {
        self.groups.get(group_id).map(|slot| slot.clone())
    }

    /// Detach the slot for `group_id`, if the group is known.
    pub fn remove_group(&self, group_id: &str) -> Option<Arc<GroupSlot>> {
        self.groups.remove(group_id).map(|(_, slot)| slot)
    }

    /// Whether `slot` is still the live slot for `group_id`.
    pub fn is_current_group(&self, group_id: &str, slot: &Arc<GroupSlot>) -> bool {
        self.groups
            .get(group_id)
            .is_some_and(|live| Arc::ptr_eq(live.value(), slot))
    }

    pub fn group_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.groups.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub(crate) fn clear_groups(&self) {
        self.groups.clear();
    }

    pub async fn snapshot(&self, now: DateTime<Utc>) -> IdentitySnapshot {
        let mut groups = Vec::new();
        for group_id in self.group_ids() {
            if let Some(slot) = self.existing_group(&group_id) {
                groups.push(slot.buffer.lock().await.snapshot(now));
            }
        }
        IdentitySnapshot {
            id: self.id.clone(),
            aid: self.aid.clone(),
            stopped: self.is_stopped(),
            connectivity: self.connectivity.lock().await.clone(),
            sessions: self.sessions.lock().await.snapshot(),
            groups,
            contacts: self.contacts.lock().await.len(),
            session_metrics: self.session_metrics.lock().await.clone(),
        }
    }
}

impl std::fmt::Debug for IdentityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityState")
            .field("id", &self.id)
            .field("aid", &self.aid)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}
