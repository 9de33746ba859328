use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::AnswerSheet;
use crate::model::ids::{AttemptId, SectionKey};
use crate::model::question::Question;
use crate::model::settings::MarkingScheme;
use crate::scoring::{ScoreCard, ScoringEngine, TopicStats};

/// What ended the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionTrigger {
    /// Explicit "Submit" action.
    Manual,
    /// "Next" pressed on the final question.
    LastQuestion,
    /// The countdown reached zero.
    TimeExpired,
}

impl CompletionTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionTrigger::Manual => "manual",
            CompletionTrigger::LastQuestion => "last-question",
            CompletionTrigger::TimeExpired => "time-expired",
        }
    }
}

/// Write-once output of a submission, handed to the results sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResults {
    attempt_id: AttemptId,
    assessment_id: String,
    section_scores: BTreeMap<SectionKey, f64>,
    total_score: f64,
    max_score: f64,
    correct_count: u32,
    incorrect_count: u32,
    unattempted_count: u32,
    answers: AnswerSheet,
    questions: Vec<Question>,
    trigger: CompletionTrigger,
    time_taken_secs: u32,
    timestamp: DateTime<Utc>,
}

/// Session context recorded alongside a score card.
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub attempt_id: AttemptId,
    pub assessment_id: String,
    pub trigger: CompletionTrigger,
    pub time_taken_secs: u32,
    pub timestamp: DateTime<Utc>,
}

impl ExamResults {
    #[must_use]
    pub fn new(
        context: SubmissionContext,
        card: ScoreCard,
        answers: AnswerSheet,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            attempt_id: context.attempt_id,
            assessment_id: context.assessment_id,
            section_scores: card.section_scores,
            total_score: card.total_score,
            max_score: card.max_score,
            correct_count: card.correct_count,
            incorrect_count: card.incorrect_count,
            unattempted_count: card.unattempted_count,
            answers,
            questions,
            trigger: context.trigger,
            time_taken_secs: context.time_taken_secs,
            timestamp: context.timestamp,
        }
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn assessment_id(&self) -> &str {
        &self.assessment_id
    }

    #[must_use]
    pub fn section_scores(&self) -> &BTreeMap<SectionKey, f64> {
        &self.section_scores
    }

    #[must_use]
    pub fn section_score(&self, key: SectionKey) -> Option<f64> {
        self.section_scores.get(&key).copied()
    }

    #[must_use]
    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    #[must_use]
    pub fn unattempted_count(&self) -> u32 {
        self.unattempted_count
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn trigger(&self) -> CompletionTrigger {
        self.trigger
    }

    #[must_use]
    pub fn time_taken_secs(&self) -> u32 {
        self.time_taken_secs
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Total score as a share of the maximum, in percent.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.max_score <= 0.0 {
            return 0.0;
        }
        self.total_score / self.max_score * 100.0
    }

    /// Topic analytics recomputed from the stored questions and answers.
    #[must_use]
    pub fn topic_breakdown(&self, marking: &MarkingScheme) -> Vec<TopicStats> {
        ScoringEngine::new(*marking).topic_breakdown(&self.questions, &self.answers)
    }
}
