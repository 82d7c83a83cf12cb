use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Aid;

/// A one-to-one message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub receiver: Aid,
    pub sender: Aid,
    /// Peer-supplied session id, if any.
    pub session_key: Option<String>,
    pub content: String,
    pub received_at: DateTime<Utc>,
}
