//! Dispatcher double with queued replies, optional latency, and call capture.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::errors::DispatchError;
use parley_core::traits::{AgentDispatcher, DispatchKind, DispatchRequest};

#[derive(Debug, Default)]
pub struct ScriptedDispatcher {
    replies: Mutex<VecDeque<Result<String, DispatchError>>>,
    fallback: Mutex<Option<String>>,
    rating: Mutex<Option<Result<String, DispatchError>>>,
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<DispatchRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next conversational reply.
    pub fn push_reply(&self, reply: impl Into<String>) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
        self
    }

    pub fn push_failure(&self, error: DispatchError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Reply used once the queue is empty.
    pub fn set_fallback(&self, reply: impl Into<String>) {
        *self.fallback.lock().unwrap() = Some(reply.into());
    }

    /// Response to rating requests. Unset means the dispatcher is unavailable.
    pub fn set_rating(&self, response: Result<String, DispatchError>) {
        *self.rating.lock().unwrap() = Some(response);
    }

    /// Latency applied to every dispatch (tokio time, so it can be paused).
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests of non-rating kinds.
    pub fn reply_requests(&self) -> Vec<DispatchRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !matches!(r.kind, DispatchKind::Rating { .. }))
            .collect()
    }

    /// Highest number of dispatches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentDispatcher for ScriptedDispatcher {
    async fn dispatch(&self, request: DispatchRequest) -> Result<String, DispatchError> {
        let is_rating = matches!(request.kind, DispatchKind::Rating { .. });
        self.requests.lock().unwrap().push(request);

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = if is_rating {
            self.rating
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(DispatchError::Unavailable("no rating scripted".into())))
        } else {
            let queued = self.replies.lock().unwrap().pop_front();
            match queued {
                Some(reply) => reply,
                None => self
                    .fallback
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| DispatchError::Unavailable("script exhausted".into())),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
