//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset: engine lifecycle at `info`, and
/// handler panics, rollbacks, and dispatch rejections from everything else.
pub const DEFAULT_LOG_FILTER: &str = "warn,deadline_engine=info";

/// `RUST_LOG` if set and valid, otherwise [`DEFAULT_LOG_FILTER`].
#[must_use]
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize tracing. Embedders can install their own subscriber; this helper
/// installs a fmt subscriber with [`default_filter`] only if none is set.
/// Worker threads are named `deadline-worker-N`, so thread names are logged.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_thread_names(true)
        .try_init();
}
