//! Structured logging setup.
//!
//! Thin wrapper over `tracing-subscriber` so the hosting core and tests can
//! initialize logging exactly once with a configurable level.

use once_cell::sync::OnceCell;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Initialize tracing with the given default level.
///
/// The `RUST_LOG` environment variable takes precedence over `level`.
/// Subsequent calls are no-ops.
pub fn init_tracing(level: &str) {
    INITIALIZED.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_names(true);

        Registry::default().with(env_filter).with(fmt_layer).init();

        tracing::debug!("Tracing initialized: level={}", level);
    });
}
