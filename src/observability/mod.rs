//! # Observability
//!
//! Structured logging setup. The library only emits `tracing` events; the
//! application decides whether and how to install a subscriber, typically by
//! calling [`init_tracing`] once at startup.

use crate::config::LoggingConfig;
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns
/// [`Error::Config`] when the directive is invalid or a global subscriber is
/// already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            Error::config_with_source(
                format!("Invalid log level '{}'", config.level),
                Box::new(e),
            )
        })?,
    };

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| Error::config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}
