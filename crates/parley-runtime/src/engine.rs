//! Orchestration engine.
//!
//! The engine is the router's inbound handler. It feeds the session
//! manager and group buffers, executes the actions they return against the
//! transport, dispatcher and scheduler, and scores every closed session.
//! Results of dispatches that finish after their identity was stopped are
//! discarded.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parley_core::config::AccountConfig;
use parley_core::errors::{ParleyResult, RouterError, TransportError};
use parley_core::models::{
    Aid, ClosedSession, ConnectionStatus, DirectMessage, SessionSummary, StatusEvent,
};
use parley_core::traits::{AgentDispatcher, DispatchKind, DispatchRequest, InboundHandler, Transport};
use parley_credit::SessionScorer;
use parley_group::{resolve_intensity, Batch, GateAction};
use parley_observability::events;
use tracing::{debug, info, instrument, warn};

use crate::clock::RuntimeClock;
use crate::identity::{IdentitySnapshot, IdentityState};
use crate::prompt::{direct_prompt, group_prompt};
use crate::reconnect::backoff_delay;
use crate::router::IdentityRouter;
use crate::scheduler::{Scheduler, TimerKey};

pub struct Engine {
    router: Arc<IdentityRouter>,
    dispatcher: Arc<dyn AgentDispatcher>,
    transports: DashMap<String, Arc<dyn Transport>>,
    scheduler: Scheduler,
    scorer: SessionScorer,
    clock: RuntimeClock,
    me: Weak<Engine>,
}

/// Installed into the router; holds the engine weakly so the two do not
/// keep each other alive.
struct EngineHandler(Weak<Engine>);

#[async_trait]
impl InboundHandler for EngineHandler {
    async fn on_direct_message(&self, identity_id: &str, message: DirectMessage) {
        if let Some(engine) = self.0.upgrade() {
            engine.handle_direct(identity_id, message).await;
        }
    }

    async fn on_group_activity(&self, identity_id: &str, group_id: &str) {
        if let Some(engine) = self.0.upgrade() {
            engine.handle_group_activity(identity_id, group_id).await;
        }
    }
}

impl Engine {
    /// Build the engine, install it as the router's inbound handler and
    /// start the timer service. Must be called inside a tokio runtime.
    pub fn start(router: Arc<IdentityRouter>, dispatcher: Arc<dyn AgentDispatcher>) -> Arc<Self> {
        Self::start_with_clock(router, dispatcher, RuntimeClock::new())
    }

    pub fn start_with_clock(
        router: Arc<IdentityRouter>,
        dispatcher: Arc<dyn AgentDispatcher>,
        clock: RuntimeClock,
    ) -> Arc<Self> {
        let (scheduler, mut timers) = Scheduler::start();
        let scorer = SessionScorer::new(&router.config().scoring, &router.config().credit);
        let engine = Arc::new_cyclic(|me| Engine {
            router: router.clone(),
            dispatcher,
            transports: DashMap::new(),
            scheduler,
            scorer,
            clock,
            me: me.clone(),
        });
        router.set_inbound_handler(Arc::new(EngineHandler(Arc::downgrade(&engine))));

        let weak = Arc::downgrade(&engine);
        tokio::spawn(async move {
            while let Some(key) = timers.recv().await {
                let Some(engine) = weak.upgrade() else { break };
                tokio::spawn(async move { engine.on_timer(key).await });
            }
        });
        engine
    }

    pub fn router(&self) -> &Arc<IdentityRouter> {
        &self.router
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn clock(&self) -> RuntimeClock {
        self.clock
    }

    /// Register `account`, bind its transport, arm its idle sweep and
    /// connect. A failed connect is recorded and retried with backoff; it
    /// does not fail registration.
    pub async fn add_identity(
        &self,
        account: &AccountConfig,
        transport: Arc<dyn Transport>,
    ) -> ParleyResult<Arc<IdentityState>> {
        let state = self.router.register_identity(account)?;
        self.transports.insert(state.id().to_string(), transport);
        self.schedule_idle_sweep(state.id());
        self.connect(&state).await;
        Ok(state)
    }

    pub async fn identity_snapshot(&self, identity_id: &str) -> Option<IdentitySnapshot> {
        let state = self.router.get_state(identity_id)?;
        Some(state.snapshot(self.clock.now()).await)
    }

    fn transport(&self, identity_id: &str) -> Option<Arc<dyn Transport>> {
        self.transports.get(identity_id).map(|t| t.value().clone())
    }

    // -----------------------------------------------------------------------
    // One-to-one flow
    // -----------------------------------------------------------------------

    /// Credit admission, session bookkeeping, agent reply, termination,
    /// send, scoring.
    #[instrument(skip(self, message), fields(sender = %message.sender))]
    pub async fn handle_direct(&self, identity_id: &str, message: DirectMessage) {
        let Some(state) = self.router.get_state(identity_id) else {
            return;
        };
        if state.is_stopped() {
            return;
        }
        let now = self.clock.now();
        let peer = message.sender.clone();

        {
            let mut contacts = state.contacts.lock().await;
            contacts.observe_peer(&peer, None, None, now);
            if contacts.should_reject_by_credit(&peer) {
                info!(
                    identity = %identity_id,
                    peer = %peer,
                    credit = contacts.credit_of(&peer),
                    "peer below credit threshold, message ignored"
                );
                return;
            }
        }

        let inbound = state.sessions.lock().await.on_inbound(
            &peer,
            message.session_key.as_deref(),
            &message.content,
            now,
        );
        let outcome = match inbound {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(identity = %identity_id, error = %e, "inbound message rejected");
                return;
            }
        };

        for evicted in outcome.evicted {
            self.finalize(&state, evicted).await;
        }
        if outcome.opened {
            state.contacts.lock().await.record_interaction(&peer, now);
            state.session_metrics.lock().await.session_opened();
        }
        let session_id = outcome.session_id;
        if let Some(closed) = outcome.closed {
            if let Some(farewell) = outcome.farewell {
                self.send_direct(&state, &peer, &session_id, &farewell).await;
            }
            self.finalize(&state, closed).await;
            return;
        }

        let Some(session) = state.sessions.lock().await.get(&session_id) else {
            return;
        };
        let credit = state.contacts.lock().await.credit_of(&peer);
        let config = state.config();
        let request = DispatchRequest {
            identity_id: identity_id.to_string(),
            kind: DispatchKind::Direct {
                peer: peer.clone(),
                session_id: session_id.clone(),
            },
            prompt: direct_prompt(state.account(), &session, &config.session, credit, &message.content),
            deadline: Duration::from_millis(config.session.reply_timeout_ms),
        };
        let reply = self.dispatch(request).await.unwrap_or_default();
        if state.is_stopped() {
            debug!(identity = %identity_id, session_id = %session_id, "identity stopped, reply discarded");
            return;
        }

        let result = state
            .sessions
            .lock()
            .await
            .on_outbound(&session_id, &reply, self.clock.now());
        let outbound = match result {
            Ok(outbound) => outbound,
            Err(e) => {
                debug!(identity = %identity_id, error = %e, "session gone before reply");
                return;
            }
        };
        if let Some(text) = outbound.send {
            self.send_direct(&state, &peer, &session_id, &text).await;
        }
        if let Some(closed) = outbound.closed {
            self.finalize(&state, closed).await;
        }
    }

    /// Open a session from our side and send its first message. Every open
    /// session with `target` is superseded.
    pub async fn send_to_peer(
        &self,
        identity_id: &str,
        target: &Aid,
        content: &str,
    ) -> ParleyResult<String> {
        let state = self
            .router
            .get_state(identity_id)
            .ok_or_else(|| RouterError::IdentityNotFound(identity_id.to_string()))?;
        if state.is_stopped() {
            return Err(RouterError::Stopped(identity_id.to_string()).into());
        }
        let transport = self
            .transport(identity_id)
            .ok_or_else(|| RouterError::IdentityNotFound(identity_id.to_string()))?;
        let now = self.clock.now();

        let start = state.sessions.lock().await.start_outbound(target, now);
        for closed in start.superseded.into_iter().chain(start.evicted) {
            self.finalize(&state, closed).await;
        }
        {
            let mut contacts = state.contacts.lock().await;
            contacts.observe_peer(target, None, None, now);
            contacts.record_interaction(target, now);
        }
        state.session_metrics.lock().await.session_opened();

        let outbound = state
            .sessions
            .lock()
            .await
            .on_outbound(&start.session_id, content, now)?;
        if let Some(text) = outbound.send {
            if let Err(e) = transport.send(target, Some(&start.session_id), &text).await {
                self.record_transport_error(&state, &e).await;
                return Err(e.into());
            }
        }
        if let Some(closed) = outbound.closed {
            self.finalize(&state, closed).await;
        }
        Ok(start.session_id)
    }

    async fn send_direct(&self, state: &IdentityState, peer: &Aid, session_id: &str, text: &str) {
        let Some(transport) = self.transport(state.id()) else {
            return;
        };
        if let Err(e) = transport.send(peer, Some(session_id), text).await {
            self.record_transport_error(state, &e).await;
        }
    }

    /// Run a dispatch under its deadline. Failures and timeouts come back as
    /// `None`; the caller treats them as an empty reply.
    async fn dispatch(&self, request: DispatchRequest) -> Option<String> {
        let deadline = request.deadline;
        let identity = request.identity_id.clone();
        match tokio::time::timeout(deadline, self.dispatcher.dispatch(request)).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!(identity = %identity, error = %e, "dispatch failed");
                None
            }
            Err(_) => {
                warn!(identity = %identity, timeout_ms = deadline.as_millis() as u64, "dispatch timed out");
                None
            }
        }
    }

    /// Score a closed session exactly once and record the result. Sessions of
    /// a stopped identity get the rule score only.
    async fn finalize(&self, state: &IdentityState, closed: ClosedSession) {
        let dispatcher: Option<&dyn AgentDispatcher> = if state.is_stopped() {
            None
        } else {
            Some(self.dispatcher.as_ref())
        };
        let score = self.scorer.score(state.id(), &closed, dispatcher).await;
        let outcome = self.scorer.outcome(&closed, score);
        let now = self.clock.now();

        state.contacts.lock().await.record_session_outcome(&outcome, now);
        state.summaries.lock().await.push(SessionSummary {
            session_id: outcome.session_id.clone(),
            peer: outcome.peer.clone(),
            is_owner: closed.session.is_owner,
            turns: outcome.turns,
            duration_ms: outcome.duration_ms,
            close_reason: outcome.close_reason,
            rule_score: outcome.score.rule_score,
            ai_score: outcome.score.ai_rating.map(|r| r.average().round() as u8),
            final_score: outcome.score.final_score,
            closed_at: closed.closed_at,
        });
        state
            .session_metrics
            .lock()
            .await
            .session_closed(closed.reason.as_str(), Duration::from_millis(outcome.duration_ms));
        events::session_closed(
            state.id(),
            &outcome.session_id,
            closed.reason.as_str(),
            outcome.turns,
            outcome.duration_ms,
            outcome.score.final_score,
        );
    }

    // -----------------------------------------------------------------------
    // Group flow
    // -----------------------------------------------------------------------

    /// Pull new messages for `group_id` and feed them to its buffer. A pull
    /// already running for the group is never joined: the caller leaves a
    /// re-pull request and returns.
    #[instrument(skip(self))]
    pub async fn handle_group_activity(&self, identity_id: &str, group_id: &str) {
        let Some(state) = self.router.get_state(identity_id) else {
            return;
        };
        let Some(transport) = self.transport(identity_id) else {
            return;
        };
        let slot = state.group(group_id);

        loop {
            if state.is_stopped() {
                return;
            }
            let guard = match slot.try_begin_pull() {
                Some(guard) => guard,
                None => {
                    slot.request_repull();
                    match slot.try_begin_pull() {
                        Some(guard) => guard,
                        None => {
                            slot.buffer.lock().await.record_rejected_pull();
                            debug!(identity = %identity_id, group_id = %group_id, "pull in progress, deferred");
                            return;
                        }
                    }
                }
            };
            slot.take_repull();

            let after = slot.buffer.lock().await.last_pulled_msg_id();
            let messages = match transport.pull_group_messages(group_id, after).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(identity = %identity_id, group_id = %group_id, error = %e, "group pull failed");
                    drop(guard);
                    if slot.take_repull() {
                        continue;
                    }
                    return;
                }
            };
            if state.is_stopped() || !state.is_current_group(group_id, &slot) {
                return;
            }

            let now = self.clock.now();
            {
                let mut contacts = state.contacts.lock().await;
                for message in messages.iter().filter(|m| m.sender != *state.aid()) {
                    contacts.observe_peer(&message.sender, None, Some(group_id), now);
                }
            }
            let actions = slot.buffer.lock().await.ingest(messages, now);
            drop(guard);
            self.apply_group_actions(&state, group_id, actions);

            if !slot.take_repull() {
                return;
            }
        }
    }

    /// Leave or dissolve a group: drop its buffer and timers and forget the
    /// membership. A dispatch still running for it finishes without sending.
    /// Returns whether the group was known.
    pub async fn leave_group(&self, identity_id: &str, group_id: &str) -> bool {
        let Some(state) = self.router.get_state(identity_id) else {
            return false;
        };
        let Some(slot) = state.remove_group(group_id) else {
            return false;
        };
        for key in [
            TimerKey::BufferWindow {
                identity: identity_id.to_string(),
                group_id: group_id.to_string(),
            },
            TimerKey::DispatchCooldown {
                identity: identity_id.to_string(),
                group_id: group_id.to_string(),
            },
        ] {
            self.scheduler.cancel(&key);
        }
        state.contacts.lock().await.forget_group(group_id, self.clock.now());
        let dropped = slot.buffer.lock().await.snapshot(self.clock.now());
        info!(
            identity = %identity_id,
            group_id = %group_id,
            buffered = dropped.buffered,
            pending = dropped.pending,
            "group left"
        );
        true
    }

    fn apply_group_actions(&self, state: &Arc<IdentityState>, group_id: &str, actions: Vec<GateAction>) {
        for action in actions {
            match action {
                GateAction::ArmWindow { at } => self.scheduler.schedule_at(
                    TimerKey::BufferWindow {
                        identity: state.id().to_string(),
                        group_id: group_id.to_string(),
                    },
                    self.clock.instant_for(at),
                ),
                GateAction::ArmCooldown { at } => self.scheduler.schedule_at(
                    TimerKey::DispatchCooldown {
                        identity: state.id().to_string(),
                        group_id: group_id.to_string(),
                    },
                    self.clock.instant_for(at),
                ),
                GateAction::Dispatch(batch) => {
                    let Some(engine) = self.me.upgrade() else {
                        continue;
                    };
                    let state = state.clone();
                    tokio::spawn(async move { engine.run_group_dispatch(state, batch).await });
                }
            }
        }
    }

    async fn run_group_dispatch(&self, state: Arc<IdentityState>, batch: Batch) {
        let Some(slot) = state.existing_group(&batch.group_id) else {
            return;
        };
        let now = self.clock.now();
        let vitality = slot.buffer.lock().await.vitality(now);
        let intensity = resolve_intensity(vitality.level, batch.mentioned);
        let config = state.config();

        let request = DispatchRequest {
            identity_id: state.id().to_string(),
            kind: DispatchKind::Group {
                group_id: batch.group_id.clone(),
            },
            prompt: group_prompt(state.account(), &batch, &vitality, intensity),
            deadline: Duration::from_millis(config.group.reply_timeout_ms),
        };
        let reply = self.dispatch(request).await;
        if state.is_stopped() || !state.is_current_group(&batch.group_id, &slot) {
            debug!(identity = %state.id(), group_id = %batch.group_id, "group gone, reply discarded");
            return;
        }

        let text = match reply {
            Some(raw) => slot.buffer.lock().await.prepare_reply(&raw, intensity),
            None => None,
        };
        if let (Some(text), Some(transport)) = (text, self.transport(state.id())) {
            match transport.send_group(&batch.group_id, &text).await {
                Ok(()) => slot.buffer.lock().await.record_self_send(&text, self.clock.now()),
                Err(e) => self.record_transport_error(&state, &e).await,
            }
        }
        if state.is_stopped() {
            return;
        }

        let completed = slot
            .buffer
            .lock()
            .await
            .on_dispatch_complete(batch.ticket, self.clock.now());
        match completed {
            Ok(actions) => self.apply_group_actions(&state, &batch.group_id, actions),
            Err(e) => warn!(identity = %state.id(), error = %e, "dispatch completion rejected"),
        }
    }

    // -----------------------------------------------------------------------
    // Connectivity
    // -----------------------------------------------------------------------

    async fn connect(&self, state: &IdentityState) {
        let Some(transport) = self.transport(state.id()) else {
            return;
        };
        self.on_status(state.id(), StatusEvent::new(ConnectionStatus::Connecting)).await;
        let event = match transport.connect().await {
            Ok(()) => StatusEvent::new(ConnectionStatus::Connected),
            Err(e) => StatusEvent::error(e.to_string()),
        };
        self.on_status(state.id(), event).await;
    }

    /// Fold a transport status event into the identity's connectivity.
    /// Errors and unexpected disconnects arm a reconnect with backoff.
    pub async fn on_status(&self, identity_id: &str, event: StatusEvent) {
        let Some(state) = self.router.get_state(identity_id) else {
            return;
        };
        let attempts = {
            let mut connectivity = state.connectivity.lock().await;
            connectivity.apply(&event, self.clock.now());
            connectivity.reconnect_attempts
        };
        events::identity_status_changed(identity_id, event.status.as_str(), event.message.as_deref());

        let key = TimerKey::Reconnect {
            identity: identity_id.to_string(),
        };
        match event.status {
            ConnectionStatus::Connected => {
                self.scheduler.cancel(&key);
            }
            ConnectionStatus::Error | ConnectionStatus::Disconnected => {
                if state.is_stopped() || self.scheduler.is_scheduled(&key) {
                    return;
                }
                match backoff_delay(attempts, &state.config().reconnect) {
                    Some(delay) => {
                        state.connectivity.lock().await.reconnect_attempts += 1;
                        debug!(
                            identity = %identity_id,
                            attempt = attempts + 1,
                            delay_ms = delay.as_millis() as u64,
                            "reconnect scheduled"
                        );
                        self.scheduler.schedule_in(key, delay);
                    }
                    None => warn!(identity = %identity_id, attempts, "reconnect attempts exhausted"),
                }
            }
            ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => {}
        }
    }

    async fn record_transport_error(&self, state: &IdentityState, error: &TransportError) {
        warn!(identity = %state.id(), error = %error, "transport send failed");
        let mut connectivity = state.connectivity.lock().await;
        connectivity.last_error = Some(error.to_string());
        connectivity.last_error_at = Some(self.clock.now());
    }

    async fn reconnect(&self, identity_id: &str) {
        let Some(state) = self.router.get_state(identity_id) else {
            return;
        };
        let Some(transport) = self.transport(identity_id) else {
            return;
        };
        self.on_status(identity_id, StatusEvent::new(ConnectionStatus::Reconnecting)).await;
        let event = match transport.connect().await {
            Ok(()) => StatusEvent::new(ConnectionStatus::Connected),
            Err(e) => StatusEvent::error(e.to_string()),
        };
        if !state.is_stopped() {
            self.on_status(identity_id, event).await;
        }
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    fn schedule_idle_sweep(&self, identity_id: &str) {
        let Some(state) = self.router.get_state(identity_id) else {
            return;
        };
        self.scheduler.schedule_in(
            TimerKey::IdleSweep {
                identity: identity_id.to_string(),
            },
            Duration::from_millis(state.config().session.idle_check_interval_ms),
        );
    }

    pub async fn on_timer(&self, key: TimerKey) {
        match key {
            TimerKey::IdleSweep { identity } => self.run_idle_sweep(&identity).await,
            TimerKey::BufferWindow { identity, group_id } => {
                self.on_group_timer(&identity, &group_id, false).await
            }
            TimerKey::DispatchCooldown { identity, group_id } => {
                self.on_group_timer(&identity, &group_id, true).await
            }
            TimerKey::Reconnect { identity } => self.reconnect(&identity).await,
        }
    }

    async fn run_idle_sweep(&self, identity_id: &str) {
        let Some(state) = self.router.get_state(identity_id) else {
            return;
        };
        if state.is_stopped() {
            return;
        }
        let closed = state.sessions.lock().await.sweep(self.clock.now());
        let session_config = &state.config().session;
        for session in closed {
            if session_config.append_end_marker_on_close {
                let peer = session.session.target.clone();
                let id = session.session.session_id.clone();
                self.send_direct(&state, &peer, &id, &session_config.end_marker).await;
            }
            self.finalize(&state, session).await;
        }
        self.schedule_idle_sweep(identity_id);
    }

    async fn on_group_timer(&self, identity_id: &str, group_id: &str, cooldown: bool) {
        let Some(state) = self.router.get_state(identity_id) else {
            return;
        };
        let Some(slot) = state.existing_group(group_id) else {
            return;
        };
        let now = self.clock.now();
        let actions = {
            let mut buffer = slot.buffer.lock().await;
            if cooldown {
                buffer.on_cooldown_elapsed(now)
            } else {
                buffer.on_window_elapsed(now)
            }
        };
        self.apply_group_actions(&state, group_id, actions);
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Stop one identity: force-close and score its sessions, drop its
    /// groups and timers, disconnect. Idempotent; returns whether anything
    /// was stopped.
    pub async fn stop_identity(&self, identity_id: &str) -> bool {
        let Some(stopped) = self.router.stop_identity(identity_id, self.clock.now()).await else {
            return false;
        };
        self.scheduler.cancel_identity(identity_id);
        if let Some((_, transport)) = self.transports.remove(identity_id) {
            if let Err(e) = transport.disconnect().await {
                debug!(identity = %identity_id, error = %e, "disconnect failed");
            }
        }
        stopped
            .state
            .connectivity
            .lock()
            .await
            .apply(&StatusEvent::new(ConnectionStatus::Disconnected), self.clock.now());
        events::identity_status_changed(identity_id, ConnectionStatus::Disconnected.as_str(), None);

        for closed in stopped.closed {
            self.finalize(&stopped.state, closed).await;
        }
        stopped.state.contacts.lock().await.flush();
        true
    }

    /// Stop every identity and the timer service.
    pub async fn shutdown(&self) {
        for id in self.router.identities() {
            self.stop_identity(&id).await;
        }
        self.scheduler.shutdown();
        self.router.clear_inbound_handler();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("router", &self.router)
            .field("timers", &self.scheduler.pending())
            .finish_non_exhaustive()
    }
}
