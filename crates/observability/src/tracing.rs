//! Tracing subscriber initialization.
//!
//! JSON lines on stderr, filtered by `RUST_LOG`. Stdout is left to the
//! binaries for their own output.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber with [`DEFAULT_FILTER`].
pub fn init() {
    init_with(DEFAULT_FILTER);
}

/// Install the global subscriber, falling back to `default_filter`.
///
/// Safe to call multiple times (subsequent calls are no-ops). Returns whether
/// this call installed the subscriber.
pub fn init_with(default_filter: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::SystemTime)
        .with_target(false);

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .try_init()
    {
        Ok(()) => {
            ::tracing::debug!(default_filter, "tracing subscriber installed");
            true
        }
        Err(err) => {
            ::tracing::debug!(error = %err, "tracing subscriber already installed; keeping it");
            false
        }
    }
}
