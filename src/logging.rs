//! Tracing subscriber setup for the watcher binary.

use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Environment variable overriding the log filter, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "AIRPLAY_WATCHER_LOG";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Installs a compact stderr formatter filtered by [`LOG_ENV`], then
/// `RUST_LOG`, then `info`.
pub fn init_logging() -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let subscriber = Registry::default()
        .with(fmt::layer().with_target(false).compact())
        .with(env_filter("info"));

    subscriber
        .try_init()
        .map_err(|e| LoggingError::TracingInit(e.to_string()))
}

fn env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var(LOG_ENV) {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}
