use serde::{Deserialize, Serialize};

use crate::model::answer::CorrectAnswer;
use crate::model::ids::QuestionId;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[default]
    MultipleChoice,
    #[serde(alias = "numeric")]
    Numerical,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// One selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    pub value: String,
}

impl QuestionOption {
    /// Option whose submitted value is its id.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            value: id.clone(),
            id,
            text: text.into(),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question as delivered by the assessment source. Immutable during a session.
///
/// `marks` is the nominal weight; the active `MarkingScheme` decides whether it is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default = "empty_id")]
    pub id: QuestionId,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<CorrectAnswer>,
    #[serde(default = "default_marks")]
    pub marks: f64,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

fn empty_id() -> QuestionId {
    QuestionId::new("")
}

fn default_marks() -> f64 {
    1.0
}

impl Question {
    /// Minimal multiple-choice question, mostly useful for tests and fixtures.
    #[must_use]
    pub fn multiple_choice(
        id: impl Into<QuestionId>,
        text: impl Into<String>,
        options: Vec<QuestionOption>,
        correct_answer: Option<CorrectAnswer>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            question_type: QuestionType::MultipleChoice,
            options,
            correct_answer,
            marks: default_marks(),
            difficulty: Difficulty::default(),
            topic: None,
            subject: None,
        }
    }

    /// Minimal numerical answer type question.
    #[must_use]
    pub fn numerical(
        id: impl Into<QuestionId>,
        text: impl Into<String>,
        correct_answer: Option<CorrectAnswer>,
    ) -> Self {
        Self {
            question_type: QuestionType::Numerical,
            ..Self::multiple_choice(id, text, Vec::new(), correct_answer)
        }
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn with_marks(mut self, marks: f64) -> Self {
        self.marks = marks;
        self
    }

    /// Questions without an identifier cannot be answered and are dropped when flattening.
    #[must_use]
    pub fn has_id(&self) -> bool {
        !self.id.as_str().trim().is_empty()
    }

    /// Topic label as delivered, falling back to `subject`.
    #[must_use]
    pub fn topic_label(&self) -> Option<&str> {
        self.topic
            .as_deref()
            .or(self.subject.as_deref())
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}
