//! Stable, machine-readable error codes for status surfaces.

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const ROUTER_ERROR: &str = "ROUTER_ERROR";
pub const UNMAPPED_ROUTE: &str = "UNMAPPED_ROUTE";
pub const SESSION_ERROR: &str = "SESSION_ERROR";
pub const GROUP_ERROR: &str = "GROUP_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const TRANSPORT_ERROR: &str = "TRANSPORT_ERROR";
pub const DISPATCH_ERROR: &str = "DISPATCH_ERROR";
pub const DISPATCH_TIMEOUT: &str = "DISPATCH_TIMEOUT";

/// Maps an error to a stable code.
pub trait ParleyErrorCode {
    fn error_code(&self) -> &'static str;
}
