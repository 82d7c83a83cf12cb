//! Error handling for Parley.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod dispatch_error;
pub mod error_code;
pub mod group_error;
pub mod parley_error;
pub mod router_error;
pub mod session_error;
pub mod storage_error;
pub mod transport_error;

pub use config_error::ConfigError;
pub use dispatch_error::DispatchError;
pub use error_code::ParleyErrorCode;
pub use group_error::GroupError;
pub use parley_error::{ParleyError, ParleyResult};
pub use router_error::RouterError;
pub use session_error::SessionError;
pub use storage_error::StorageError;
pub use transport_error::TransportError;
