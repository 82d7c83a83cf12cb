//! # parley-observability
//!
//! Tracing subscriber setup, one structured event per lifecycle transition,
//! and in-process counters surfaced through identity snapshots.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::{GroupMetrics, SessionMetrics};
pub use tracing_setup::events;
pub use tracing_setup::init_tracing;
