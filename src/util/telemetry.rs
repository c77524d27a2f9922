//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable: drain summaries and
/// stage failures from this crate, nothing from dependencies.
pub const DEFAULT_LOG_FILTER: &str = "subscription_notify=info";

/// Filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install a fmt subscriber for queue workers unless the host application
/// already installed one.
///
/// Queue workers log one `info` line per drain run and `warn` lines for every
/// stage or transport failure, each tagged with `queue` and `item_id`.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let installed = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(default_filter = DEFAULT_LOG_FILTER, "notification tracing installed");
    }
}
