//! Top-level error aggregating every subsystem via `From` conversions.

use super::error_code::ParleyErrorCode;
use super::{
    ConfigError, DispatchError, GroupError, RouterError, SessionError, StorageError,
    TransportError,
};

#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Group error: {0}")]
    Group(#[from] GroupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

impl ParleyErrorCode for ParleyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Router(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::Group(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Transport(e) => e.error_code(),
            Self::Dispatch(e) => e.error_code(),
        }
    }
}

pub type ParleyResult<T> = Result<T, ParleyError>;
