//! AID → identity multiplexer.
//!
//! The router is an ordinary value: construct one, register accounts, hand
//! it an inbound handler. Lookups by id and by AID are O(1).

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parley_core::config::{AccountConfig, ParleyConfig};
use parley_core::errors::{ParleyResult, RouterError};
use parley_core::models::{Aid, ClosedSession, CloseReason, DirectMessage};
use parley_core::traits::InboundHandler;
use parley_observability::events;
use parley_storage::open_identity_stores;
use tracing::{debug, info};

use crate::identity::IdentityState;

/// What `stop_identity` hands back: the detached state and the sessions it
/// force-closed, still to be scored by the caller.
#[derive(Debug)]
pub struct StoppedIdentity {
    pub state: Arc<IdentityState>,
    pub closed: Vec<ClosedSession>,
}

pub struct IdentityRouter {
    config: ParleyConfig,
    identities: DashMap<String, Arc<IdentityState>>,
    by_aid: DashMap<Aid, String>,
    handler: RwLock<Option<Arc<dyn InboundHandler>>>,
}

impl IdentityRouter {
    pub fn new(config: ParleyConfig) -> Self {
        Self {
            config,
            identities: DashMap::new(),
            by_aid: DashMap::new(),
            handler: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// Create the isolated runtime state for `account`.
    ///
    /// Fails with `AlreadyRegistered` for a known id and `AidInUse` when the
    /// AID is bound to another identity; registration never replaces.
    pub fn register_identity(&self, account: &AccountConfig) -> ParleyResult<Arc<IdentityState>> {
        let aid = Aid::from(account.aid.as_str());
        if self.identities.contains_key(&account.id) {
            return Err(RouterError::AlreadyRegistered(account.id.clone()).into());
        }
        if let Some(owner) = self.by_aid.get(&aid) {
            return Err(RouterError::AidInUse {
                aid: aid.to_string(),
                owner: owner.clone(),
            }
            .into());
        }

        let stores = open_identity_stores(&self.config.storage, &account.id);

        match self.identities.entry(account.id.clone()) {
            Entry::Occupied(_) => Err(RouterError::AlreadyRegistered(account.id.clone()).into()),
            Entry::Vacant(identity_slot) => match self.by_aid.entry(aid.clone()) {
                Entry::Occupied(owner) => Err(RouterError::AidInUse {
                    aid: aid.to_string(),
                    owner: owner.get().clone(),
                }
                .into()),
                Entry::Vacant(aid_slot) => {
                    let state = Arc::new(IdentityState::new(account, &self.config, stores));
                    aid_slot.insert(account.id.clone());
                    identity_slot.insert(state.clone());
                    info!(identity = %account.id, aid = %aid, "identity registered");
                    Ok(state)
                }
            },
        }
    }

    pub fn get_state(&self, identity_id: &str) -> Option<Arc<IdentityState>> {
        self.identities.get(identity_id).map(|e| e.value().clone())
    }

    pub fn get_state_by_aid(&self, aid: &Aid) -> Option<Arc<IdentityState>> {
        let id = self.by_aid.get(aid).map(|e| e.value().clone())?;
        self.get_state(&id)
    }

    /// Registered identity ids, sorted.
    pub fn identities(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.identities.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn set_inbound_handler(&self, handler: Arc<dyn InboundHandler>) {
        *self.handler.write().unwrap_or_else(|e| e.into_inner()) = Some(handler);
    }

    pub fn clear_inbound_handler(&self) {
        *self.handler.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn handler(&self) -> Option<Arc<dyn InboundHandler>> {
        self.handler.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Owning identity for an inbound event. Unmapped AIDs are dropped and
    /// logged, never queued.
    fn resolve(&self, receiver: &Aid, sender: &str) -> Result<Arc<IdentityState>, RouterError> {
        let Some(state) = self.get_state_by_aid(receiver) else {
            events::route_dropped(receiver.as_str(), sender);
            return Err(RouterError::UnmappedRoute(receiver.to_string()));
        };
        if state.is_stopped() {
            return Err(RouterError::Stopped(state.id().to_string()));
        }
        Ok(state)
    }

    pub async fn route_inbound(&self, message: DirectMessage) -> Result<(), RouterError> {
        let state = self.resolve(&message.receiver, message.sender.as_str())?;
        let handler = self.handler().ok_or(RouterError::NoHandler)?;
        debug!(identity = %state.id(), sender = %message.sender, "routing direct message");
        handler.on_direct_message(state.id(), message).await;
        Ok(())
    }

    pub async fn route_group_activity(&self, receiver: &Aid, group_id: &str) -> Result<(), RouterError> {
        let state = self.resolve(receiver, group_id)?;
        let handler = self.handler().ok_or(RouterError::NoHandler)?;
        handler.on_group_activity(state.id(), group_id).await;
        Ok(())
    }

    /// Detach an identity and force-close its sessions. Stopping an unknown
    /// or already stopped identity is a no-op.
    pub async fn stop_identity(&self, identity_id: &str, now: DateTime<Utc>) -> Option<StoppedIdentity> {
        let (_, state) = self.identities.remove(identity_id)?;
        self.by_aid.remove(state.aid());
        if !state.mark_stopped() {
            return None;
        }
        let closed = state.sessions.lock().await.close_all(CloseReason::Forced, now);
        state.clear_groups();
        info!(identity = %identity_id, closed = closed.len(), "identity stopped");
        Some(StoppedIdentity { state, closed })
    }

    pub async fn stop_all(&self, now: DateTime<Utc>) -> Vec<StoppedIdentity> {
        let mut stopped = Vec::new();
        for id in self.identities() {
            if let Some(s) = self.stop_identity(&id, now).await {
                stopped.push(s);
            }
        }
        stopped
    }
}

impl std::fmt::Debug for IdentityRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRouter")
            .field("identities", &self.identities())
            .finish_non_exhaustive()
    }
}
