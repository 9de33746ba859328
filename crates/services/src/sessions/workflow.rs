use std::sync::Arc;

use exam_core::model::{Assessment, ExamResults, ExamSettings};
use exam_core::{ExamObserver, ExamSession};
use storage::repository::{
    AssessmentRepository, DEFAULT_RESULTS_KEY, ResultsRepository, Storage, StoredResults,
};

use super::runner::ExamRunner;
use crate::Clock;
use crate::config::ServiceConfig;
use crate::error::{BootstrapError, SessionError};

/// Loads assessments, starts timed runners, and reads back stored results.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    assessments: Arc<dyn AssessmentRepository>,
    results: Arc<dyn ResultsRepository>,
    settings: ExamSettings,
    results_key: String,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        assessments: Arc<dyn AssessmentRepository>,
        results: Arc<dyn ResultsRepository>,
    ) -> Self {
        Self {
            clock,
            assessments,
            results,
            settings: ExamSettings::default(),
            results_key: DEFAULT_RESULTS_KEY.to_string(),
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.assessments),
            Arc::clone(&storage.results),
        )
    }

    /// Open the configured SQLite database and apply the configured exam settings.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Sqlite` if the database cannot be opened or migrated.
    pub async fn bootstrap(config: &ServiceConfig, clock: Clock) -> Result<Self, BootstrapError> {
        let storage = Storage::sqlite(config.database_url()).await?;
        tracing::info!(
            database_url = config.database_url(),
            results_key = config.results_key(),
            duration_secs = config.settings().duration_secs(),
            "exam services ready"
        );
        Ok(Self::from_storage(clock, &storage)
            .with_settings(config.settings().clone())
            .with_results_key(config.results_key()))
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ExamSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_results_key(mut self, key: impl Into<String>) -> Self {
        self.results_key = key.into();
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the assessment is missing or unreadable.
    pub async fn load_assessment(&self, assessment_id: &str) -> Result<Assessment, SessionError> {
        Ok(self.assessments.get_assessment(assessment_id).await?)
    }

    /// Load an assessment and start a timed attempt on it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the assessment cannot be loaded, or
    /// `SessionError::Exam` if it has no questions.
    pub async fn start_exam(&self, assessment_id: &str) -> Result<ExamRunner, SessionError> {
        let assessment = self.load_assessment(assessment_id).await?;
        self.start_runner(ExamSession::new(&assessment, self.settings.clone()))
    }

    /// Same as [`ExamLoopService::start_exam`], reporting session events to `observer`.
    ///
    /// # Errors
    ///
    /// See [`ExamLoopService::start_exam`].
    pub async fn start_exam_with_observer(
        &self,
        assessment_id: &str,
        observer: Box<dyn ExamObserver>,
    ) -> Result<ExamRunner, SessionError> {
        let assessment = self.load_assessment(assessment_id).await?;
        let session =
            ExamSession::new(&assessment, self.settings.clone()).with_observer(observer);
        self.start_runner(session)
    }

    fn start_runner(&self, session: ExamSession) -> Result<ExamRunner, SessionError> {
        ExamRunner::start(
            session,
            self.clock,
            Arc::clone(&self.results),
            self.results_key.clone(),
        )
    }

    /// Most recent stored submission, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn latest_results(&self) -> Result<Option<ExamResults>, SessionError> {
        Ok(self.results.latest_results(&self.results_key).await?)
    }

    /// Stored submissions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on backend failures.
    pub async fn results_history(&self, limit: u32) -> Result<Vec<StoredResults>, SessionError> {
        Ok(self.results.list_results(&self.results_key, limit).await?)
    }
}
