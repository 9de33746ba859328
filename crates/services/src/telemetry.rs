use tracing_subscriber::{EnvFilter, fmt};

use crate::config::TelemetryConfig;
use crate::error::TelemetryError;

/// Install the global fmt subscriber. `RUST_LOG` wins over the configured level.
///
/// # Errors
///
/// Returns `TelemetryError::Filter` for an unparsable configured level, or
/// `TelemetryError::AlreadyInstalled` if a global subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|err| TelemetryError::Filter {
            filter: config.log_level.clone(),
            reason: err.to_string(),
        })?,
    };

    let builder = fmt().with_env_filter(filter).with_target(false);

    if config.json {
        builder
            .json()
            .try_init()
            .map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))?;
    } else {
        builder
            .try_init()
            .map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))?;
    }

    Ok(())
}
