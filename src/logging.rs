//! Logging initialization for embedding applications.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// The `RUST_LOG` environment variable takes precedence; without it the
/// level falls back to `debug` when `verbose` is set and `info` otherwise.
/// Calling this twice is a no-op.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
