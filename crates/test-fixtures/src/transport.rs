//! In-memory transport that records traffic and serves scripted group pulls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::errors::TransportError;
use parley_core::models::{Aid, GroupMessage};
use parley_core::traits::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub target: Aid,
    pub session_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentMessage>>,
    group_sent: Mutex<Vec<(String, String)>>,
    group_messages: Mutex<HashMap<String, Vec<GroupMessage>>>,
    pull_delay: Mutex<Option<Duration>>,
    fail_sends: AtomicBool,
    fail_connects: AtomicUsize,
    fail_pulls: AtomicUsize,
    connects: AtomicUsize,
    pulls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a message available to subsequent pulls of its group.
    pub fn push_group_message(&self, message: GroupMessage) {
        let mut groups = self.group_messages.lock().unwrap();
        groups
            .entry(message.group_id.clone())
            .or_default()
            .push(message);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn group_sent(&self) -> Vec<(String, String)> {
        self.group_sent.lock().unwrap().clone()
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Fail the next `n` connect attempts.
    pub fn fail_next_connects(&self, n: usize) {
        self.fail_connects.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` group pulls, after their delay.
    pub fn fail_next_pulls(&self, n: usize) {
        self.fail_pulls.store(n, Ordering::SeqCst);
    }

    pub fn set_pull_delay(&self, delay: Duration) {
        *self.pull_delay.lock().unwrap() = Some(delay);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn pull_count(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::ConnectFailed("scripted failure".into()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(
        &self,
        target: &Aid,
        session_id: Option<&str>,
        content: &str,
    ) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed {
                target: target.to_string(),
                message: "scripted failure".into(),
            });
        }
        self.sent.lock().unwrap().push(SentMessage {
            target: target.clone(),
            session_id: session_id.map(str::to_string),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn send_group(&self, group_id: &str, content: &str) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed {
                target: group_id.to_string(),
                message: "scripted failure".into(),
            });
        }
        self.group_sent
            .lock()
            .unwrap()
            .push((group_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn pull_group_messages(
        &self,
        group_id: &str,
        after_id: u64,
    ) -> Result<Vec<GroupMessage>, TransportError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.pull_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let remaining = self.fail_pulls.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_pulls.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::PullFailed {
                group_id: group_id.to_string(),
                message: "scripted failure".into(),
            });
        }
        let groups = self.group_messages.lock().unwrap();
        Ok(groups
            .get(group_id)
            .map(|msgs| {
                msgs.iter()
                    .filter(|m| m.msg_id > after_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
