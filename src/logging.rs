//! Logging setup for the station daemon.
//!
//! All modules log through `tracing` macros with structured fields. This
//! installs the console subscriber once at startup; `RUST_LOG` overrides the
//! default filter (e.g. `RUST_LOG=landmon_service=debug`).

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "landmon_service=info";

/// Installs the global `tracing` subscriber. Safe to call more than once;
/// later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
