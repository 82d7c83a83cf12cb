//! Tracing setup: subscriber initialisation and structured event helpers.

pub mod events;

use std::sync::Once;

use parley_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// `PARLEY_LOG` takes precedence over `config.log_level` and accepts full
/// filter directives (`parley_session=debug,info`). Idempotent.
pub fn init_tracing(config: &ObservabilityConfig) {
    let fallback = config.log_level.clone();
    let json = config.log_format == "json";
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("PARLEY_LOG")
            .or_else(|_| EnvFilter::try_new(&fallback))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);
        // An already-installed subscriber (embedding host, test harness) wins.
        let _ = if json {
            builder
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .try_init()
        } else {
            builder.try_init()
        };
    });
}

/// Initialize tracing with an explicit filter string (for tests or embedding).
pub fn init_tracing_with_filter(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(true)
        .with_test_writer()
        .try_init();
}
