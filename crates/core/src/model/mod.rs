mod answer;
mod assessment;
mod ids;
mod question;
mod results;
mod settings;

pub use answer::{AnswerError, AnswerSheet, AnswerValue, CorrectAnswer};
pub use assessment::{Assessment, QuestionLayout, Section, SectionSpan, Sections};
pub use ids::{AttemptId, QuestionId, SectionKey, UnknownSectionKey};
pub use question::{Difficulty, Question, QuestionOption, QuestionType};
pub use results::{CompletionTrigger, ExamResults, SubmissionContext};
pub use settings::{
    DEFAULT_DURATION_SECS, DEFAULT_PENALTY_FRACTION, DEFAULT_QUESTION_WEIGHT, ExamSettings,
    ExamSettingsError, MarkingScheme,
};
