//! Service configuration read from the process environment.

use std::env;

use exam_core::model::{
    DEFAULT_DURATION_SECS, DEFAULT_PENALTY_FRACTION, ExamSettings, MarkingScheme,
};
use storage::repository::DEFAULT_RESULTS_KEY;

use crate::error::ConfigError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging setup consumed by [`crate::telemetry::init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    database_url: String,
    results_key: String,
    settings: ExamSettings,
    telemetry: TelemetryConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            results_key: DEFAULT_RESULTS_KEY.to_string(),
            settings: ExamSettings::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Read `EXAM_*` variables, falling back to defaults for unset or blank ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first variable that fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let duration_secs = match get("EXAM_DURATION_SECS") {
            Some(value) => parse_duration("EXAM_DURATION_SECS", value)?,
            None => DEFAULT_DURATION_SECS,
        };
        let marking = match get("EXAM_MARKING") {
            Some(value) => parse_marking("EXAM_MARKING", value)?,
            None => MarkingScheme::default(),
        };
        let json = match get("EXAM_LOG_JSON") {
            Some(value) => parse_bool("EXAM_LOG_JSON", value)?,
            None => false,
        };

        Ok(Self {
            database_url: get("EXAM_DB_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            results_key: get("EXAM_RESULTS_KEY").unwrap_or_else(|| DEFAULT_RESULTS_KEY.to_string()),
            settings: ExamSettings::new(duration_secs, marking)?,
            telemetry: TelemetryConfig {
                log_level: get("EXAM_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
                json,
            },
        })
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ExamSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    #[must_use]
    pub fn results_key(&self) -> &str {
        &self.results_key
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    #[must_use]
    pub fn telemetry(&self) -> &TelemetryConfig {
        &self.telemetry
    }
}

fn parse_duration(field: &'static str, value: String) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

fn parse_bool(field: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

// `fixed` (GATE weights) or `declared` (per-question marks).
fn parse_marking(field: &'static str, value: String) -> Result<MarkingScheme, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "fixed" => Ok(MarkingScheme::default()),
        "declared" => Ok(MarkingScheme::declared(DEFAULT_PENALTY_FRACTION)?),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}
