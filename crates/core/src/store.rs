use std::collections::BTreeMap;

use crate::model::{AnswerSheet, AnswerValue, QuestionId};

/// In-memory answers for the active session, keyed by question id.
///
/// Later writes overwrite earlier ones. No shape validation happens here.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    answers: BTreeMap<QuestionId, AnswerValue>,
}

impl QuestionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite-or-insert. Returns the previous value, if any.
    pub fn set(&mut self, id: QuestionId, value: AnswerValue) -> Option<AnswerValue> {
        self.answers.insert(id, value)
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&AnswerValue> {
        self.answers.get(id)
    }

    /// Number of distinct question ids with a recorded value.
    #[must_use]
    pub fn count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn snapshot(&self) -> AnswerSheet {
        self.answers.clone()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}
