//! Logging setup for the binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Overrides the configured log level, e.g. `SHEETCAST_LOG=sheetcast_core=debug`.
pub const LOG_ENV: &str = "SHEETCAST_LOG";

/// Install a stderr subscriber. Safe to call more than once.
pub fn init(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}
