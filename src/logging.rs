//! Logging initialization and configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither `RUST_LOG` nor a configured level is present.
const DEFAULT_FILTER: &str = "session_ctx=info";

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Build a filter from a configured level such as `debug`.
///
/// A bare level is scoped to this crate. Anything containing `=` or `,` is
/// treated as a full directive string and passed through.
fn filter_for(level: &str) -> EnvFilter {
    let level = level.trim();
    if level.is_empty() {
        return default_filter();
    }
    let directive = if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("session_ctx={}", level)
    };
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Try to initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `session_ctx=info`. Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

/// Try to initialize logging with an explicit level from configuration.
pub fn init_with_filter(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
}
