#![forbid(unsafe_code)]

//! Timed exam engine: question flow, answer/status bookkeeping, countdown state and
//! negative-marking scoring. Pure and synchronous; timers and persistence live in
//! the services and storage crates.

pub mod error;
pub mod model;
pub mod navigation;
pub mod scoring;
pub mod session;
pub mod status;
pub mod store;
pub mod time;
pub mod timer;

pub use error::ExamError;
pub use navigation::{NavigationController, NavigationError, Step};
pub use scoring::{FALLBACK_TOPIC, Outcome, ScoreCard, ScoringEngine, TopicStats};
pub use session::{Advance, ExamObserver, ExamSession, SessionProgress, SessionState};
pub use status::{QuestionStatus, StatusKind, StatusTracker};
pub use store::QuestionStore;
pub use time::Clock;
pub use timer::{Countdown, Start, Tick};
