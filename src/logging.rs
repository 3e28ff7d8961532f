//! Logging setup
//!
//! Operations log through `tracing`; applications that want to see those
//! events install a subscriber with [`init`].

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Environment variable overriding the configured log filter
pub const LOG_ENV_VAR: &str = "MONGO_OPS_LOG";

/// Build the filter for a logging configuration
///
/// `MONGO_OPS_LOG` takes precedence over the configured level when set.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()))
}

/// Install a global fmt subscriber
///
/// Returns `false` when a global subscriber was already installed.
pub fn init(config: &LoggingConfig) -> bool {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_target(false);

    if config.timestamps {
        subscriber.try_init().is_ok()
    } else {
        subscriber.without_time().try_init().is_ok()
    }
}
