//! Structured logging setup.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "queuify=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG` (falling back to
/// [`DEFAULT_FILTER`]). Does nothing if a global subscriber is already set,
/// so applications remain free to install their own.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
