//! # parley-session
//!
//! Sans-IO session lifecycle for one identity. Every operation takes `now`
//! and returns what the caller must send and which sessions closed; closed
//! sessions leave the manager immediately and are handed out exactly once.

pub mod manager;
pub mod policy;
pub mod session;

pub use manager::{InboundOutcome, OutboundOutcome, OutboundStart, SessionManager};
pub use session::Session;
