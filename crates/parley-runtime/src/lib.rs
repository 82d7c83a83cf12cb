//! # parley-runtime
//!
//! Wires the pure subsystems to the outside world: the `IdentityRouter`
//! owns one `IdentityState` per configured account, the `Scheduler` drives
//! every timer from a single deadline queue, and the `Engine` runs the
//! one-to-one and group flows against the transport and dispatcher.

pub mod clock;
pub mod engine;
pub mod identity;
pub mod prompt;
pub mod reconnect;
pub mod router;
pub mod scheduler;

pub use clock::RuntimeClock;
pub use engine::Engine;
pub use identity::{GroupSlot, IdentitySnapshot, IdentityState};
pub use reconnect::backoff_delay;
pub use router::{IdentityRouter, StoppedIdentity};
pub use scheduler::{DeadlineQueue, Scheduler, TimerKey};
