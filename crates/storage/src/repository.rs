use async_trait::async_trait;
use exam_core::model::{Assessment, AttemptId, ExamResults};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Storage key the results history is kept under unless configured otherwise.
pub const DEFAULT_RESULTS_KEY: &str = "gateExamResults";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// One persisted submission with its storage row id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResults {
    pub id: i64,
    pub key: String,
    pub results: ExamResults,
}

/// Source of assessment documents.
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Persist or replace an assessment document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` for an empty assessment id, or other storage errors.
    async fn upsert_assessment(&self, assessment: &Assessment) -> Result<(), StorageError>;

    /// Fetch an assessment by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_assessment(&self, id: &str) -> Result<Assessment, StorageError>;
}

/// Sink for submitted results, grouped under a fixed storage key.
#[async_trait]
pub trait ResultsRepository: Send + Sync {
    /// Append a submission. Each attempt can be stored once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt was already stored.
    async fn save_results(&self, key: &str, results: &ExamResults) -> Result<i64, StorageError>;

    /// Most recent submission under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a row cannot be decoded.
    async fn latest_results(&self, key: &str) -> Result<Option<ExamResults>, StorageError>;

    /// Submissions under `key`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a row cannot be decoded.
    async fn list_results(&self, key: &str, limit: u32) -> Result<Vec<StoredResults>, StorageError>;
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    assessments: Arc<Mutex<HashMap<String, Assessment>>>,
    results: Arc<Mutex<Vec<StoredResults>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            assessments: Arc::new(Mutex::new(HashMap::new())),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryRepository {
    async fn upsert_assessment(&self, assessment: &Assessment) -> Result<(), StorageError> {
        validate_key(&assessment.id)?;
        let mut guard = self
            .assessments
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(assessment.id.clone(), assessment.clone());
        Ok(())
    }

    async fn get_assessment(&self, id: &str) -> Result<Assessment, StorageError> {
        let guard = self
            .assessments
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResultsRepository for InMemoryRepository {
    async fn save_results(&self, key: &str, results: &ExamResults) -> Result<i64, StorageError> {
        validate_key(key)?;
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let attempt: AttemptId = results.attempt_id();
        if guard.iter().any(|row| row.results.attempt_id() == attempt) {
            return Err(StorageError::Conflict);
        }
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("row id overflow".into()))?;
        guard.push(StoredResults {
            id,
            key: key.to_string(),
            results: results.clone(),
        });
        Ok(id)
    }

    async fn latest_results(&self, key: &str) -> Result<Option<ExamResults>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .rev()
            .find(|row| row.key == key)
            .map(|row| row.results.clone()))
    }

    async fn list_results(&self, key: &str, limit: u32) -> Result<Vec<StoredResults>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard
            .iter()
            .rev()
            .filter(|row| row.key == key)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub assessments: Arc<dyn AssessmentRepository>,
    pub results: Arc<dyn ResultsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let assessments: Arc<dyn AssessmentRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultsRepository> = Arc::new(repo);
        Self {
            assessments,
            results,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use exam_core::model::{
        AttemptId, CompletionTrigger, CorrectAnswer, Question, Section, SectionKey,
        SubmissionContext,
    };
    use exam_core::scoring::ScoringEngine;
    use exam_core::time::fixed_now;

    use super::*;

    pub(crate) fn build_assessment(id: &str) -> Assessment {
        let core = Section {
            title: "Core".into(),
            questions: vec![
                Question::numerical("c1", "1+1", Some(CorrectAnswer::new("2")))
                    .with_topic("Arithmetic - Sums"),
                Question::numerical("c2", "2+2", Some(CorrectAnswer::new("4"))),
            ],
            ..Section::default()
        };
        Assessment::new(id, "Fixture").with_section(SectionKey::Core, core)
    }

    pub(crate) fn build_results(assessment: &Assessment) -> ExamResults {
        let layout = assessment.layout();
        let answers = exam_core::model::AnswerSheet::new();
        let card = ScoringEngine::default().score_layout(&layout, &answers);
        let context = SubmissionContext {
            attempt_id: AttemptId::generate(),
            assessment_id: assessment.id.clone(),
            trigger: CompletionTrigger::TimeExpired,
            time_taken_secs: 60,
            timestamp: fixed_now(),
        };
        ExamResults::new(context, card, answers, layout.questions().to_vec())
    }
}
