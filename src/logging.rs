//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a formatted tracing subscriber.
///
/// The level is taken from `RUST_LOG` and defaults to `info`, e.g.
/// `RUST_LOG=dothttp=debug` shows parser and capture activity. Calling this
/// more than once is harmless; later calls leave the first subscriber in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("logging initialized");
    }
}
