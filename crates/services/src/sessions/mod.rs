mod runner;
mod workflow;

// Public API of the exam session subsystem.
pub use crate::error::SessionError;
pub use runner::ExamRunner;
pub use workflow::ExamLoopService;
