use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use exam_core::model::{AnswerValue, ExamResults};
use exam_core::status::QuestionStatus;
use exam_core::{Advance, ExamSession, SessionProgress};
use storage::repository::{ResultsRepository, StorageError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::Clock;
use crate::error::SessionError;
use crate::timer::TimerService;

type PersistTask = JoinHandle<Result<i64, StorageError>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//
// ─── RESULTS SINK ──────────────────────────────────────────────────────────────
//

/// Hands completed results to the repository on a background task.
#[derive(Clone)]
struct ResultsSink {
    runtime: Handle,
    repo: Arc<dyn ResultsRepository>,
    key: Arc<str>,
    pending: Arc<Mutex<Option<PersistTask>>>,
}

impl ResultsSink {
    fn dispatch(&self, results: ExamResults) {
        tracing::info!(
            attempt_id = %results.attempt_id(),
            assessment_id = results.assessment_id(),
            trigger = results.trigger().as_str(),
            total_score = results.total_score(),
            correct = results.correct_count(),
            incorrect = results.incorrect_count(),
            unattempted = results.unattempted_count(),
            "exam completed"
        );

        let repo = Arc::clone(&self.repo);
        let key = Arc::clone(&self.key);
        let task = self.runtime.spawn(async move {
            match repo.save_results(&key, &results).await {
                Ok(row_id) => {
                    tracing::debug!(row_id, attempt_id = %results.attempt_id(), "results persisted");
                    Ok(row_id)
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        attempt_id = %results.attempt_id(),
                        "failed to persist exam results"
                    );
                    Err(err)
                }
            }
        });
        *lock(&self.pending) = Some(task);
    }

    fn take_pending(&self) -> Option<PersistTask> {
        lock(&self.pending).take()
    }
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// A started exam attempt: the session, its countdown, and the results sink.
///
/// Timer expiry, manual submission and "Next" on the last question all go
/// through the session's single completion path, so results are emitted and
/// persisted at most once per attempt. Dropping the runner cancels the timer.
pub struct ExamRunner {
    session: Arc<Mutex<ExamSession>>,
    timer: TimerService,
    clock: Clock,
    sink: ResultsSink,
}

impl ExamRunner {
    /// Start `session` and its countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoRuntime` outside a tokio runtime, or
    /// `SessionError::Exam` if the session cannot start (e.g. no questions).
    pub fn start(
        session: ExamSession,
        clock: Clock,
        results: Arc<dyn ResultsRepository>,
        results_key: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let sink = ResultsSink {
            runtime,
            repo: results,
            key: Arc::from(results_key.into()),
            pending: Arc::new(Mutex::new(None)),
        };
        let mut runner = Self {
            session: Arc::new(Mutex::new(session)),
            timer: TimerService::new(),
            clock,
            sink,
        };
        runner.begin()?;
        Ok(runner)
    }

    fn begin(&mut self) -> Result<(), SessionError> {
        let duration_secs = {
            let mut session = lock(&self.session);
            session.start(self.clock.now())?;
            tracing::info!(
                assessment_id = session.assessment_id(),
                attempt_id = %session.attempt_id(),
                questions = session.questions().len(),
                duration_secs = session.settings().duration_secs(),
                "exam started"
            );
            i64::from(session.settings().duration_secs())
        };

        let on_tick = {
            let session = Arc::clone(&self.session);
            move |remaining: u32| {
                lock(&session).tick(remaining);
            }
        };
        let on_expire = {
            let session = Arc::clone(&self.session);
            let sink = self.sink.clone();
            let clock = self.clock;
            move || {
                let completed = lock(&session).expire(clock.now());
                if let Some(results) = completed {
                    sink.dispatch(results);
                }
            }
        };
        self.timer.start(duration_secs, on_tick, on_expire)
    }

    // ─── Commands ───────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `SessionError::Exam` for a non-finite number, a kind mismatch, or when
    /// the exam is not in progress.
    pub fn answer(&self, value: AnswerValue) -> Result<QuestionStatus, SessionError> {
        Ok(lock(&self.session).answer_current(value)?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Exam` when the exam is not in progress.
    pub fn toggle_review(&self) -> Result<QuestionStatus, SessionError> {
        Ok(lock(&self.session).toggle_review_current()?)
    }

    /// Advance, submitting on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Exam` when the exam is not in progress.
    pub fn next(&mut self) -> Result<Advance, SessionError> {
        let advance = lock(&self.session).next(self.clock.now())?;
        if let Advance::Submitted(results) = &advance {
            self.finish(results.clone());
        }
        Ok(advance)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Exam` when the exam is not in progress.
    pub fn previous(&self) -> Result<usize, SessionError> {
        Ok(lock(&self.session).previous()?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Exam` for an out-of-range index (cursor unchanged)
    /// or when the exam is not in progress.
    pub fn jump_to(&self, index: i64) -> Result<usize, SessionError> {
        let result = lock(&self.session).jump_to(index);
        if let Err(err) = &result {
            tracing::debug!(index, error = %err, "jump ignored");
        }
        Ok(result?)
    }

    /// Submit now. `None` if the exam had already completed.
    pub fn submit(&mut self) -> Option<ExamResults> {
        let completed = lock(&self.session).submit(self.clock.now());
        if let Some(results) = &completed {
            self.finish(results.clone());
        }
        completed
    }

    /// Drop the current attempt and start a fresh one with a new attempt id.
    ///
    /// Persistence of the previous attempt keeps running in the background.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Exam` if the session cannot restart.
    pub fn retake(&mut self) -> Result<(), SessionError> {
        self.timer.stop();
        lock(&self.session).reset();
        self.begin()
    }

    /// Stop the countdown without submitting, e.g. when the user navigates away.
    pub fn abandon(&mut self) {
        if self.timer.is_running() {
            let session = lock(&self.session);
            tracing::info!(
                attempt_id = %session.attempt_id(),
                remaining_secs = session.remaining_secs(),
                "exam abandoned"
            );
        }
        self.timer.stop();
    }

    fn finish(&mut self, results: ExamResults) {
        self.timer.stop();
        self.sink.dispatch(results);
    }

    // ─── Queries ────────────────────────────────────────────────────────────────

    /// Run `f` against the current session state.
    pub fn view<R>(&self, f: impl FnOnce(&ExamSession) -> R) -> R {
        f(&lock(&self.session))
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        lock(&self.session).progress()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        lock(&self.session).remaining_secs()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        lock(&self.session).is_complete()
    }

    #[must_use]
    pub fn results(&self) -> Option<ExamResults> {
        lock(&self.session).results().cloned()
    }

    #[must_use]
    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Wait for the latest results write. `Ok(None)` if nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the write failed, or
    /// `SessionError::Persistence` if the background task did not finish.
    pub async fn wait_persisted(&self) -> Result<Option<i64>, SessionError> {
        let Some(task) = self.sink.take_pending() else {
            return Ok(None);
        };
        let row_id = task
            .await
            .map_err(|err| SessionError::Persistence(err.to_string()))??;
        Ok(Some(row_id))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use exam_core::model::{
        Assessment, CompletionTrigger, CorrectAnswer, ExamSettings, MarkingScheme, Question,
        Section, SectionKey,
    };
    use exam_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, StoredResults};

    use super::*;

    fn assessment() -> Assessment {
        let core = Section {
            title: "Core".into(),
            questions: vec![
                Question::numerical("q1", "2+2", Some(CorrectAnswer::new("4"))),
                Question::numerical("q2", "3+3", Some(CorrectAnswer::new("6"))),
            ],
            ..Section::default()
        };
        Assessment::new("mini", "Mini").with_section(SectionKey::Core, core)
    }

    fn session(duration_secs: u32) -> ExamSession {
        let settings = ExamSettings::new(duration_secs, MarkingScheme::default()).unwrap();
        ExamSession::new(&assessment(), settings)
    }

    struct FailingResults;

    #[async_trait]
    impl ResultsRepository for FailingResults {
        async fn save_results(&self, _key: &str, _results: &ExamResults) -> Result<i64, StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }

        async fn latest_results(&self, _key: &str) -> Result<Option<ExamResults>, StorageError> {
            Ok(None)
        }

        async fn list_results(
            &self,
            _key: &str,
            _limit: u32,
        ) -> Result<Vec<StoredResults>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_submits_and_persists_once() {
        let repo = InMemoryRepository::new();
        let runner =
            ExamRunner::start(session(3), fixed_clock(), Arc::new(repo.clone()), "k").unwrap();
        runner.answer(AnswerValue::Numeric(4.0)).unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runner.remaining_secs(), 1);
        assert!(!runner.is_complete());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(runner.is_complete());
        assert_eq!(runner.remaining_secs(), 0);
        let results = runner.results().unwrap();
        assert_eq!(results.trigger(), CompletionTrigger::TimeExpired);
        assert_eq!(results.time_taken_secs(), 3);
        assert!((results.total_score() - 1.5).abs() < 1e-9);

        assert!(runner.wait_persisted().await.unwrap().is_some());
        assert_eq!(repo.list_results("k", 10).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_expires_on_start_without_ticking() {
        let repo = InMemoryRepository::new();
        let settings = ExamSettings::default().with_duration_unchecked(0);
        let session = ExamSession::new(&assessment(), settings);
        let runner = ExamRunner::start(session, fixed_clock(), Arc::new(repo.clone()), "k").unwrap();

        assert!(runner.is_complete());
        assert!(!runner.is_timer_running());
        let results = runner.results().unwrap();
        assert_eq!(results.trigger(), CompletionTrigger::TimeExpired);
        assert_eq!(results.time_taken_secs(), 0);
        assert_eq!(results.unattempted_count(), 2);

        runner.wait_persisted().await.unwrap();
        assert_eq!(repo.list_results("k", 10).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_stops_the_timer() {
        let repo = InMemoryRepository::new();
        let mut runner =
            ExamRunner::start(session(5), fixed_clock(), Arc::new(repo.clone()), "k").unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        let results = runner.submit().unwrap();
        assert_eq!(results.trigger(), CompletionTrigger::Manual);
        assert_eq!(results.time_taken_secs(), 1);
        assert!(!runner.is_timer_running());
        assert!(runner.submit().is_none());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runner.remaining_secs(), 4);
        runner.wait_persisted().await.unwrap();
        assert_eq!(repo.list_results("k", 10).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn next_past_the_last_question_submits() {
        let repo = InMemoryRepository::new();
        let mut runner =
            ExamRunner::start(session(60), fixed_clock(), Arc::new(repo.clone()), "k").unwrap();
        assert!(matches!(runner.next().unwrap(), Advance::Moved(1)));
        match runner.next().unwrap() {
            Advance::Submitted(results) => {
                assert_eq!(results.trigger(), CompletionTrigger::LastQuestion);
            }
            other => panic!("expected submission, got {other:?}"),
        }
        assert!(matches!(
            runner.next(),
            Err(SessionError::Exam(exam_core::ExamError::Completed))
        ));
        runner.wait_persisted().await.unwrap();
        assert!(repo.latest_results("k").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn persistence_failure_does_not_block_completion() {
        let mut runner =
            ExamRunner::start(session(60), fixed_clock(), Arc::new(FailingResults), "k").unwrap();
        let results = runner.submit().unwrap();
        assert_eq!(runner.results(), Some(results));
        assert!(matches!(
            runner.wait_persisted().await,
            Err(SessionError::Storage(StorageError::Connection(_)))
        ));
        assert!(runner.wait_persisted().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_keeps_the_attempt_open_without_time_passing() {
        let repo = InMemoryRepository::new();
        let mut runner =
            ExamRunner::start(session(3), fixed_clock(), Arc::new(repo.clone()), "k").unwrap();
        runner.abandon();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!runner.is_complete());
        assert_eq!(runner.remaining_secs(), 3);
        assert!(repo.latest_results("k").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retake_starts_a_new_attempt() {
        let repo = InMemoryRepository::new();
        let mut runner =
            ExamRunner::start(session(60), fixed_clock(), Arc::new(repo.clone()), "k").unwrap();
        let first = runner.submit().unwrap();
        runner.wait_persisted().await.unwrap();

        runner.retake().unwrap();
        assert!(!runner.is_complete());
        assert!(runner.is_timer_running());
        let second = runner.submit().unwrap();
        assert_ne!(first.attempt_id(), second.attempt_id());
        runner.wait_persisted().await.unwrap();
        assert_eq!(repo.list_results("k", 10).await.unwrap().len(), 2);
    }
}
