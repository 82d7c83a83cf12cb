//! Identity routing errors.

use super::error_code::{self, ParleyErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// An identity with this id is already registered.
    #[error("identity already registered: {0}")]
    AlreadyRegistered(String),

    /// The AID is already bound to another identity.
    #[error("aid {aid} is already bound to identity {owner}")]
    AidInUse { aid: String, owner: String },

    /// No identity is registered under this id.
    #[error("identity not found: {0}")]
    IdentityNotFound(String),

    /// Inbound traffic for an AID no identity owns. Dropped, never retried.
    #[error("no identity owns aid {0}")]
    UnmappedRoute(String),

    /// No inbound handler has been installed yet.
    #[error("no inbound handler registered")]
    NoHandler,

    /// The identity was stopped while the operation was in flight.
    #[error("identity {0} is stopped")]
    Stopped(String),
}

impl ParleyErrorCode for RouterError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnmappedRoute(_) => error_code::UNMAPPED_ROUTE,
            _ => error_code::ROUTER_ERROR,
        }
    }
}
