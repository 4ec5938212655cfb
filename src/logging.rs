//! `tracing` subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;

/// Default filter directive for a configured level
pub fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Quiet => "warn",
        LogLevel::Normal => "info",
        LogLevel::Verbose => "debug",
        LogLevel::Debug => "trace",
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level` when it is set.
pub fn init(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));

    // `try_init` only fails if a subscriber is already installed; tests call
    // this repeatedly.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
