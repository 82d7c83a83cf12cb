//! Configuration system for Parley.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod credit_config;
pub mod defaults;
pub mod group_config;
pub mod parley_config;
pub mod runtime_config;
pub mod session_config;

pub use credit_config::{CreditConfig, ScoringConfig};
pub use group_config::GroupConfig;
pub use parley_config::{CliOverrides, ParleyConfig};
pub use runtime_config::{
    AccountConfig, ObservabilityConfig, ReconnectConfig, StorageBackend, StorageConfig,
};
pub use session_config::SessionConfig;
