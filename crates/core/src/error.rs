use thiserror::Error;

use crate::model::{AnswerError, QuestionId, QuestionType};
use crate::navigation::NavigationError;

/// Errors returned by `ExamSession` operations.
///
/// None of these are fatal: the session state is unchanged whenever one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("exam has not started")]
    NotStarted,
    #[error("exam already started")]
    AlreadyStarted,
    #[error("exam already completed")]
    Completed,
    #[error("no questions available")]
    NoQuestions,
    #[error("answer kind does not match question {question} (expected {expected:?})")]
    AnswerKindMismatch {
        question: QuestionId,
        expected: QuestionType,
    },
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}
