//! Single timer service for every identity, session and group.
//!
//! All deadlines live in one `DeadlineQueue`; one tokio task sleeps until
//! the earliest and forwards due keys over a channel. Re-scheduling a key
//! replaces its deadline, so there is never more than one timer per key.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// What a timer is for. Every key belongs to exactly one identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    IdleSweep { identity: String },
    BufferWindow { identity: String, group_id: String },
    DispatchCooldown { identity: String, group_id: String },
    Reconnect { identity: String },
}

impl TimerKey {
    pub fn identity(&self) -> &str {
        match self {
            Self::IdleSweep { identity }
            | Self::BufferWindow { identity, .. }
            | Self::DispatchCooldown { identity, .. }
            | Self::Reconnect { identity } => identity,
        }
    }
}

/// Min-heap of deadlines with at most one live entry per key.
///
/// Replaced and cancelled entries stay in the heap and are skipped lazily;
/// `live` is authoritative.
#[derive(Debug)]
pub struct DeadlineQueue<K> {
    heap: BinaryHeap<Reverse<(Instant, u64, K)>>,
    live: HashMap<K, u64>,
    seq: u64,
}

impl<K: Clone + Eq + Hash + Ord> DeadlineQueue<K> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            seq: 0,
        }
    }

    /// Arm `key` for `at`. Returns `true` when an earlier entry was replaced.
    pub fn schedule(&mut self, key: K, at: Instant) -> bool {
        self.seq += 1;
        let replaced = self.live.insert(key.clone(), self.seq).is_some();
        self.heap.push(Reverse((at, self.seq, key)));
        replaced
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        self.live.remove(key).is_some()
    }

    /// Cancel every key matching `pred`. Returns how many were live.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.live.len();
        self.live.retain(|k, _| !pred(k));
        before - self.live.len()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.live.contains_key(key)
    }

    /// Earliest live deadline.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_stale();
        self.heap.peek().map(|Reverse((at, _, _))| *at)
    }

    /// Remove and return every key due at `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();
        loop {
            self.discard_stale();
            match self.heap.peek() {
                Some(Reverse((at, _, _))) if *at <= now => {}
                _ => break,
            }
            if let Some(Reverse((_, _, key))) = self.heap.pop() {
                self.live.remove(&key);
                due.push(key);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse((_, seq, key))) = self.heap.peek() {
            if self.live.get(key) == Some(seq) {
                return;
            }
            self.heap.pop();
        }
    }
}

impl<K: Clone + Eq + Hash + Ord> Default for DeadlineQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

struct Shared {
    queue: Mutex<DeadlineQueue<TimerKey>>,
    notify: Notify,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, DeadlineQueue<TimerKey>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle to the timer task. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Scheduler {
    /// Spawn the timer task. Due keys arrive on the returned receiver.
    pub fn start() -> (Self, mpsc::UnboundedReceiver<TimerKey>) {
        let shared = Arc::new(Shared {
            queue: Mutex::new(DeadlineQueue::new()),
            notify: Notify::new(),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(shared.clone(), tx));
        let scheduler = Self {
            shared,
            task: Arc::new(Mutex::new(Some(task))),
        };
        (scheduler, rx)
    }

    pub fn schedule_in(&self, key: TimerKey, delay: Duration) {
        self.schedule_at(key, Instant::now() + delay);
    }

    pub fn schedule_at(&self, key: TimerKey, at: Instant) {
        trace!(?key, "timer armed");
        self.shared.queue().schedule(key, at);
        self.shared.notify.notify_one();
    }

    pub fn cancel(&self, key: &TimerKey) -> bool {
        let cancelled = self.shared.queue().cancel(key);
        if cancelled {
            self.shared.notify.notify_one();
        }
        cancelled
    }

    /// Drop every timer of `identity`.
    pub fn cancel_identity(&self, identity: &str) -> usize {
        let cancelled = self.shared.queue().cancel_where(|k| k.identity() == identity);
        if cancelled > 0 {
            debug!(identity = %identity, cancelled, "timers cancelled");
            self.shared.notify.notify_one();
        }
        cancelled
    }

    pub fn is_scheduled(&self, key: &TimerKey) -> bool {
        self.shared.queue().contains(key)
    }

    pub fn pending(&self) -> usize {
        self.shared.queue().len()
    }

    /// Stop the timer task. Pending timers never fire.
    pub fn shutdown(&self) {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

async fn run(shared: Arc<Shared>, tx: mpsc::UnboundedSender<TimerKey>) {
    loop {
        let next = shared.queue().next_deadline();
        match next {
            Some(at) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => {}
                    _ = shared.notify.notified() => continue,
                }
            }
            None => {
                shared.notify.notified().await;
                continue;
            }
        }
        let due = shared.queue().pop_due(Instant::now());
        for key in due {
            trace!(?key, "timer fired");
            if tx.send(key).is_err() {
                return;
            }
        }
    }
}
