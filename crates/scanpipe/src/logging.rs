//! Process-wide tracing subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::error::ScanError;

/// Parses a filter directive such as `info,scanpipe::pipeline=debug`.
pub fn filter_from(level: &str) -> Result<EnvFilter, ScanError> {
    EnvFilter::try_new(level)
        .map_err(|e| ScanError::Logging(format!("invalid log filter '{}': {}", level, e)))
}

/// Installs the global subscriber and routes `log` records into it.
///
/// `RUST_LOG` takes precedence over `logging.level`. Fails if a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), ScanError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_from(&config.level)?,
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(config.json.then(|| fmt::layer().json()))
        .with((!config.json).then(|| fmt::layer()));

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ScanError::Logging(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| ScanError::Logging(e.to_string()))?;

    Ok(())
}
