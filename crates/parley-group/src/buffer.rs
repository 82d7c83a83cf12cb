//! Two-stage dispatch gate for one group.
//!
//! Stage one aggregates pulled messages for `group_buffer_gate_ms` (or the
//! shorter `mention_delay_ms` once the identity is mentioned). Stage two
//! spaces agent invocations by `group_dispatch_cooldown_ms` and keeps at
//! most one dispatch in flight. Messages arriving meanwhile wait in
//! `pending` and go out together in the next batch.
//!
//! The buffer is sans-IO: callers pass `now` and execute the returned
//! `GateAction`s.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use parley_core::config::GroupConfig;
use parley_core::errors::GroupError;
use parley_core::models::{Aid, GroupMessage, GroupVitalityState};
use parley_observability::{events, GroupMetrics};
use serde::Serialize;
use tracing::debug;

use crate::intensity::{post_process, resolve_intensity, ReplyIntensity};
use crate::mention::MentionMatcher;
use crate::vitality::VitalityWindow;

/// Messages handed to the agent in one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub ticket: u64,
    pub group_id: String,
    pub messages: Vec<GroupMessage>,
    /// Any message in the batch mentions the identity.
    pub mentioned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// (Re)arm the aggregation timer for this group.
    ArmWindow { at: DateTime<Utc> },
    /// Arm the cooldown timer; dispatch is retried when it fires.
    ArmCooldown { at: DateTime<Utc> },
    Dispatch(Batch),
}

/// Point-in-time view of a group buffer.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSnapshot {
    pub group_id: String,
    pub buffered: usize,
    pub pending: usize,
    pub in_flight: Option<u64>,
    pub last_pulled_msg_id: u64,
    pub window_deadline: Option<DateTime<Utc>>,
    pub cooldown_deadline: Option<DateTime<Utc>>,
    pub last_dispatch_at: Option<DateTime<Utc>>,
    pub vitality: GroupVitalityState,
    pub metrics: GroupMetrics,
}

pub struct GroupBuffer {
    identity_id: String,
    group_id: String,
    own_aid: Aid,
    config: GroupConfig,
    matcher: MentionMatcher,

    buffer: Vec<GroupMessage>,
    buffer_mentioned: bool,
    window_deadline: Option<DateTime<Utc>>,

    pending: Vec<GroupMessage>,
    pending_mentioned: bool,
    cooldown_deadline: Option<DateTime<Utc>>,
    in_flight: Option<u64>,
    next_ticket: u64,
    last_dispatch_at: Option<DateTime<Utc>>,

    last_pulled_msg_id: u64,
    seen: BTreeSet<u64>,

    vitality: VitalityWindow,
    recent_replies: VecDeque<blake3::Hash>,
    metrics: GroupMetrics,
}

impl GroupBuffer {
    pub fn new(
        identity_id: impl Into<String>,
        group_id: impl Into<String>,
        own_aid: Aid,
        matcher: MentionMatcher,
        config: &GroupConfig,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            group_id: group_id.into(),
            own_aid,
            matcher,
            vitality: VitalityWindow::new(config.vitality_window_ms),
            config: config.clone(),
            buffer: Vec::new(),
            buffer_mentioned: false,
            window_deadline: None,
            pending: Vec::new(),
            pending_mentioned: false,
            cooldown_deadline: None,
            in_flight: None,
            next_ticket: 1,
            last_dispatch_at: None,
            last_pulled_msg_id: 0,
            seen: BTreeSet::new(),
            recent_replies: VecDeque::new(),
            metrics: GroupMetrics::new(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Highest message id accepted so far; the next pull starts after it.
    pub fn last_pulled_msg_id(&self) -> u64 {
        self.last_pulled_msg_id
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn metrics(&self) -> &GroupMetrics {
        &self.metrics
    }

    pub fn record_rejected_pull(&mut self) {
        self.metrics.pulls_rejected += 1;
    }

    /// Accept freshly pulled messages. Duplicates and the identity's own
    /// echoes are dropped; the window timer is armed when the buffer goes
    /// from empty to non-empty and pulled forward on a mention.
    pub fn ingest(&mut self, mut messages: Vec<GroupMessage>, now: DateTime<Utc>) -> Vec<GateAction> {
        messages.sort_by_key(|m| m.msg_id);
        let was_empty = self.buffer.is_empty();
        let mut mentioned_now = false;

        for message in messages {
            if message.msg_id <= self.last_pulled_msg_id || !self.seen.insert(message.msg_id) {
                self.metrics.duplicates_dropped += 1;
                continue;
            }
            self.last_pulled_msg_id = message.msg_id;
            if message.sender == self.own_aid {
                continue;
            }
            let at = message.sent_at.min(now);
            self.vitality.record(at, message.sender.clone());
            if self.matcher.is_mentioned(&message.content) {
                mentioned_now = true;
            }
            self.metrics.messages_accepted += 1;
            self.buffer.push(message);
        }
        self.prune_seen();

        let mut actions = Vec::new();
        if self.buffer.is_empty() {
            return actions;
        }
        if was_empty || self.window_deadline.is_none() {
            let at = now + ms(self.config.group_buffer_gate_ms);
            self.window_deadline = Some(at);
            actions.push(GateAction::ArmWindow { at });
        }
        if mentioned_now {
            self.buffer_mentioned = true;
            let fast = now + ms(self.config.mention_delay_ms);
            if self.window_deadline.is_some_and(|at| fast < at) {
                self.window_deadline = Some(fast);
                actions.retain(|a| !matches!(a, GateAction::ArmWindow { .. }));
                actions.push(GateAction::ArmWindow { at: fast });
            }
        }
        actions
    }

    /// The aggregation timer fired. Stale firings (window moved or already
    /// flushed) are ignored.
    pub fn on_window_elapsed(&mut self, now: DateTime<Utc>) -> Vec<GateAction> {
        match self.window_deadline {
            Some(at) if now >= at => self.flush(now),
            _ => {
                debug!(group_id = %self.group_id, "window timer ignored");
                Vec::new()
            }
        }
    }

    /// Move everything buffered into pending and try to dispatch.
    pub fn flush(&mut self, now: DateTime<Utc>) -> Vec<GateAction> {
        self.window_deadline = None;
        self.pending.append(&mut self.buffer);
        self.pending_mentioned |= std::mem::take(&mut self.buffer_mentioned);
        self.try_dispatch(now)
    }

    pub fn on_cooldown_elapsed(&mut self, now: DateTime<Utc>) -> Vec<GateAction> {
        self.cooldown_deadline = None;
        self.try_dispatch(now)
    }

    /// Release pending messages as one batch if no dispatch is in flight and
    /// the cooldown since the previous dispatch start has passed.
    pub fn try_dispatch(&mut self, now: DateTime<Utc>) -> Vec<GateAction> {
        if self.pending.is_empty() || self.in_flight.is_some() {
            return Vec::new();
        }
        if let Some(last) = self.last_dispatch_at {
            let eligible = last + ms(self.config.group_dispatch_cooldown_ms);
            if now < eligible {
                if self.cooldown_deadline == Some(eligible) {
                    return Vec::new();
                }
                self.cooldown_deadline = Some(eligible);
                self.metrics.dispatches_deferred += 1;
                events::dispatch_deferred(
                    &self.identity_id,
                    &self.group_id,
                    (eligible - now).num_milliseconds(),
                    self.pending.len(),
                );
                return vec![GateAction::ArmCooldown { at: eligible }];
            }
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.last_dispatch_at = Some(now);
        self.cooldown_deadline = None;
        self.metrics.batches_dispatched += 1;
        let messages = std::mem::take(&mut self.pending);
        let mentioned = std::mem::take(&mut self.pending_mentioned);
        events::group_batch_dispatched(&self.identity_id, &self.group_id, ticket, messages.len());
        vec![GateAction::Dispatch(Batch {
            ticket,
            group_id: self.group_id.clone(),
            messages,
            mentioned,
        })]
    }

    /// Close out the dispatch identified by `ticket`; anything that piled up
    /// meanwhile is considered for the next batch.
    pub fn on_dispatch_complete(
        &mut self,
        ticket: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<GateAction>, GroupError> {
        if self.in_flight != Some(ticket) {
            return Err(GroupError::StaleTicket {
                group_id: self.group_id.clone(),
                ticket,
            });
        }
        self.in_flight = None;
        Ok(self.try_dispatch(now))
    }

    pub fn is_mentioned(&self, content: &str) -> bool {
        self.matcher.is_mentioned(content)
    }

    pub fn vitality(&mut self, now: DateTime<Utc>) -> GroupVitalityState {
        self.vitality.compute(&self.own_aid, now)
    }

    pub fn intensity(&mut self, mentioned: bool, now: DateTime<Utc>) -> ReplyIntensity {
        resolve_intensity(self.vitality(now).level, mentioned)
    }

    /// Shape an agent reply and decide whether it goes out. Returns `None`
    /// for replies that come out empty or repeat a recent reply.
    pub fn prepare_reply(
        &mut self,
        raw: &str,
        intensity: ReplyIntensity,
    ) -> Option<String> {
        let text = post_process(raw, intensity, &self.config);
        if text.is_empty() || self.is_repeat(&text) {
            debug!(
                identity = %self.identity_id,
                group_id = %self.group_id,
                empty = text.is_empty(),
                "group reply suppressed"
            );
            self.metrics.replies_suppressed += 1;
            return None;
        }
        Some(text)
    }

    pub fn is_repeat(&self, text: &str) -> bool {
        let hash = reply_hash(text);
        self.recent_replies.contains(&hash)
    }

    /// Count a reply the identity actually sent into the group.
    pub fn record_self_send(&mut self, text: &str, now: DateTime<Utc>) {
        self.vitality.record(now, self.own_aid.clone());
        self.metrics.replies_sent += 1;
        if self.config.recent_reply_hashes == 0 {
            return;
        }
        self.recent_replies.push_back(reply_hash(text));
        while self.recent_replies.len() > self.config.recent_reply_hashes {
            self.recent_replies.pop_front();
        }
    }

    pub fn snapshot(&mut self, now: DateTime<Utc>) -> GroupSnapshot {
        GroupSnapshot {
            group_id: self.group_id.clone(),
            buffered: self.buffer.len(),
            pending: self.pending.len(),
            in_flight: self.in_flight,
            last_pulled_msg_id: self.last_pulled_msg_id,
            window_deadline: self.window_deadline,
            cooldown_deadline: self.cooldown_deadline,
            last_dispatch_at: self.last_dispatch_at,
            vitality: self.vitality(now),
            metrics: self.metrics.clone(),
        }
    }

    fn prune_seen(&mut self) {
        let capacity = self.config.seen_ids_capacity.max(1);
        if self.seen.len() <= capacity {
            return;
        }
        let keep_from = self.last_pulled_msg_id.saturating_sub(capacity as u64 / 2);
        self.seen = self.seen.split_off(&keep_from);
    }
}

fn reply_hash(text: &str) -> blake3::Hash {
    let normalized: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    blake3::hash(normalized.as_bytes())
}

fn ms(value: u64) -> Duration {
    Duration::milliseconds(value as i64)
}
