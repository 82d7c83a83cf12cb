//! In-process counters. Not exported anywhere; read through snapshots.

pub mod group_metrics;
pub mod session_metrics;

pub use group_metrics::GroupMetrics;
pub use session_metrics::SessionMetrics;
