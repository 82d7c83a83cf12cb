//! Agent dispatcher errors.

use super::error_code::{self, ParleyErrorCode};

#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatcher timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("dispatcher unavailable: {0}")]
    Unavailable(String),

    #[error("malformed dispatcher response: {0}")]
    Malformed(String),
}

impl ParleyErrorCode for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => error_code::DISPATCH_TIMEOUT,
            _ => error_code::DISPATCH_ERROR,
        }
    }
}
