use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DispatchError;
use crate::models::Aid;

/// What a dispatch is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchKind {
    Direct { peer: Aid, session_id: String },
    Group { group_id: String },
    /// Structured quality rating of a finished session.
    Rating { peer: Aid, session_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub identity_id: String,
    pub kind: DispatchKind,
    pub prompt: String,
    /// The caller abandons the dispatch after this long.
    pub deadline: Duration,
}

/// External agent that produces reply text.
#[async_trait]
pub trait AgentDispatcher: Send + Sync {
    async fn dispatch(&self, request: DispatchRequest) -> Result<String, DispatchError>;
}
