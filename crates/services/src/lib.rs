#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod sessions;
pub mod telemetry;
pub mod timer;

pub use exam_core::Clock;
pub use sessions as session;

pub use config::{ServiceConfig, TelemetryConfig};
pub use error::{BootstrapError, ConfigError, SessionError, TelemetryError};
pub use sessions::{ExamLoopService, ExamRunner};
pub use telemetry::init_tracing;
pub use timer::TimerService;
