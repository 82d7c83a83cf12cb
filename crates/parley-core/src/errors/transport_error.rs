//! Network transport errors. Recorded as identity-level `last_error`.

use super::error_code::{self, ParleyErrorCode};

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    #[error("connection failed: {0}")]
    ConnectFailed(String),

    #[error("send to {target} failed: {message}")]
    SendFailed { target: String, message: String },

    #[error("pull from group {group_id} failed: {message}")]
    PullFailed { group_id: String, message: String },
}

impl ParleyErrorCode for TransportError {
    fn error_code(&self) -> &'static str {
        error_code::TRANSPORT_ERROR
    }
}
