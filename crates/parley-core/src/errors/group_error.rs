//! Group pipeline errors.

use super::error_code::{self, ParleyErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("group not joined: {0}")]
    NotJoined(String),

    /// The completed dispatch does not match the one in flight.
    #[error("stale dispatch ticket {ticket} for group {group_id}")]
    StaleTicket { group_id: String, ticket: u64 },
}

impl ParleyErrorCode for GroupError {
    fn error_code(&self) -> &'static str {
        error_code::GROUP_ERROR
    }
}
