//! One-to-one session errors.

use super::error_code::{self, ParleyErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    /// Closed sessions are terminal; a new session must be opened instead.
    #[error("session {0} is closed")]
    Closed(String),

    /// A peer reused a session id that belongs to another target.
    #[error("session {session_id} belongs to {owner}, not {target}")]
    TargetMismatch {
        session_id: String,
        owner: String,
        target: String,
    },
}

impl ParleyErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        error_code::SESSION_ERROR
    }
}
