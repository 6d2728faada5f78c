//! Diagnostic logging setup.

use tracing_subscriber::filter::EnvFilter;

/// Level used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LEVEL: &str = "info";

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
