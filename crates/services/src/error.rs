//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::ExamError;
use exam_core::model::ExamSettingsError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the exam runner and loop service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("exam already completed")]
    Completed,
    #[error("no async runtime available to drive the exam timer")]
    NoRuntime,
    #[error("results persistence task failed: {0}")]
    Persistence(String),
    #[error(transparent)]
    Exam(#[from] ExamError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while reading service configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error(transparent)]
    Settings(#[from] ExamSettingsError),
}

/// Errors emitted while bootstrapping the exam services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while installing the tracing subscriber.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("invalid log filter {filter:?}: {reason}")]
    Filter { filter: String, reason: String },
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}
