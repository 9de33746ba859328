use chrono::{DateTime, Utc};

use crate::error::ExamError;
use crate::model::{
    AnswerValue, Assessment, AttemptId, CompletionTrigger, ExamResults, ExamSettings, Question,
    QuestionLayout, SectionSpan, SubmissionContext,
};
use crate::navigation::{NavigationController, Step};
use crate::scoring::ScoringEngine;
use crate::status::{QuestionStatus, StatusKind, StatusTracker};
use crate::store::QuestionStore;

//
// ─── OBSERVER ──────────────────────────────────────────────────────────────────
//

/// Side effects the session exposes to its owner (UI re-render, timer display, results sink).
///
/// Every method defaults to a no-op.
pub trait ExamObserver: Send {
    /// Called once per answer or review-mark mutation with the 1-based position.
    fn answer_changed(&mut self, _position: usize, _status: QuestionStatus) {}

    /// Called once per accepted timer tick.
    fn tick(&mut self, _remaining_secs: u32) {}

    /// Called exactly once per session, when it completes.
    fn completed(&mut self, _results: &ExamResults) {}
}

struct NoopObserver;

impl ExamObserver for NoopObserver {}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// Result of pressing "Next".
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved(usize),
    /// "Next" on the final question submitted the exam.
    Submitted(ExamResults),
}

/// Aggregated view of session progress, useful for the question palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub marked_for_review: usize,
    pub answered_and_marked: usize,
    pub not_answered: usize,
    pub remaining_secs: u32,
    pub state: SessionState,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Timed exam over the flattened question list of one assessment.
///
/// `NotStarted -> InProgress -> Completed`. Completion is one-shot: whichever of expiry,
/// manual submit or "Next" on the last question arrives first scores the exam; later
/// triggers are no-ops.
pub struct ExamSession {
    assessment_id: String,
    title: String,
    layout: QuestionLayout,
    settings: ExamSettings,
    scoring: ScoringEngine,
    state: SessionState,
    store: QuestionStore,
    status: StatusTracker,
    nav: NavigationController,
    remaining_secs: u32,
    attempt_id: AttemptId,
    started_at: Option<DateTime<Utc>>,
    results: Option<ExamResults>,
    observer: Box<dyn ExamObserver>,
}

impl ExamSession {
    /// Build a session. An assessment without usable questions yields an empty session.
    #[must_use]
    pub fn new(assessment: &Assessment, settings: ExamSettings) -> Self {
        let layout = assessment.layout();
        let nav = NavigationController::new(layout.len());
        Self {
            assessment_id: assessment.id.clone(),
            title: assessment.title.clone(),
            layout,
            scoring: ScoringEngine::new(*settings.marking()),
            remaining_secs: settings.duration_secs(),
            settings,
            state: SessionState::NotStarted,
            store: QuestionStore::new(),
            status: StatusTracker::new(),
            nav,
            attempt_id: AttemptId::generate(),
            started_at: None,
            results: None,
            observer: Box::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn ExamObserver>) -> Self {
        self.observer = observer;
        self
    }

    // Accessors
    #[must_use]
    pub fn assessment_id(&self) -> &str {
        &self.assessment_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// True when the assessment supplied no questions ("no questions available").
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.layout.questions()
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionSpan] {
        self.layout.spans()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn results(&self) -> Option<&ExamResults> {
        self.results.as_ref()
    }

    /// 0-based index of the current question.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.nav.current()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.layout.questions().get(self.nav.current())
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&SectionSpan> {
        self.layout.section_of(self.nav.current())
    }

    #[must_use]
    pub fn answer_of(&self, question: &Question) -> Option<&AnswerValue> {
        self.store.get(&question.id)
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<&AnswerValue> {
        self.current_question().and_then(|q| self.answer_of(q))
    }

    /// Status of the question at 1-based `position`.
    #[must_use]
    pub fn status_of(&self, position: usize) -> QuestionStatus {
        self.status.status_of(position)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.layout.len();
        let count = |kind| self.status.positions_with(kind).count();
        let answered = count(StatusKind::Answered);
        let marked_for_review = count(StatusKind::MarkedForReview);
        let answered_and_marked = count(StatusKind::AnsweredAndMarked);
        SessionProgress {
            total,
            answered,
            marked_for_review,
            answered_and_marked,
            not_answered: total.saturating_sub(answered + marked_for_review + answered_and_marked),
            remaining_secs: self.remaining_secs,
            state: self.state,
        }
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// `NotStarted -> InProgress`. Resets the remaining time to the configured duration.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NoQuestions` for an empty assessment, or
    /// `ExamError::AlreadyStarted` / `ExamError::Completed` when not in `NotStarted`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), ExamError> {
        match self.state {
            SessionState::InProgress => return Err(ExamError::AlreadyStarted),
            SessionState::Completed => return Err(ExamError::Completed),
            SessionState::NotStarted => {}
        }
        if self.layout.is_empty() {
            return Err(ExamError::NoQuestions);
        }
        self.remaining_secs = self.settings.duration_secs();
        self.started_at = Some(now);
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// Record `value` for the current question and mark it answered.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Answer` for a non-finite numeric value,
    /// `ExamError::AnswerKindMismatch` if the value kind does not fit the question
    /// type, or a state error outside `InProgress`.
    pub fn answer_current(&mut self, value: AnswerValue) -> Result<QuestionStatus, ExamError> {
        self.ensure_in_progress()?;
        let index = self.nav.current();
        let question = self
            .layout
            .questions()
            .get(index)
            .ok_or(ExamError::NoQuestions)?;

        value.validate()?;
        if value.question_type() != question.question_type {
            return Err(ExamError::AnswerKindMismatch {
                question: question.id.clone(),
                expected: question.question_type,
            });
        }

        self.store.set(question.id.clone(), value);
        let position = index + 1;
        let status = self.status.on_answered(position);
        self.observer.answer_changed(position, status);
        Ok(status)
    }

    /// Flip the review mark of the current question.
    ///
    /// # Errors
    ///
    /// Returns a state error outside `InProgress`.
    pub fn toggle_review_current(&mut self) -> Result<QuestionStatus, ExamError> {
        self.ensure_in_progress()?;
        let position = self.nav.current() + 1;
        let status = self.status.toggle_review_mark(position);
        self.observer.answer_changed(position, status);
        Ok(status)
    }

    /// Advance; on the last question this submits the exam.
    ///
    /// # Errors
    ///
    /// Returns a state error outside `InProgress`.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<Advance, ExamError> {
        self.ensure_in_progress()?;
        match self.nav.next() {
            Step::Moved(index) => Ok(Advance::Moved(index)),
            Step::AtEnd => self
                .complete(CompletionTrigger::LastQuestion, now)
                .map(Advance::Submitted)
                .ok_or(ExamError::Completed),
        }
    }

    /// # Errors
    ///
    /// Returns a state error outside `InProgress`.
    pub fn previous(&mut self) -> Result<usize, ExamError> {
        self.ensure_in_progress()?;
        Ok(self.nav.previous())
    }

    /// Jump to a 0-based index. Out-of-range requests leave the cursor untouched.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Navigation` for an out-of-range index, or a state error
    /// outside `InProgress`.
    pub fn jump_to(&mut self, index: i64) -> Result<usize, ExamError> {
        self.ensure_in_progress()?;
        Ok(self.nav.jump_to(index)?)
    }

    /// Mirror a timer tick. Ignored unless in progress.
    pub fn tick(&mut self, remaining_secs: u32) -> bool {
        if self.state != SessionState::InProgress {
            return false;
        }
        self.remaining_secs = remaining_secs;
        self.observer.tick(remaining_secs);
        true
    }

    /// Timer expiry path. Returns the results only if this call completed the session.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Option<ExamResults> {
        if self.state == SessionState::InProgress {
            self.remaining_secs = 0;
        }
        self.complete(CompletionTrigger::TimeExpired, now)
    }

    /// Manual submit path. Returns the results only if this call completed the session.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Option<ExamResults> {
        self.complete(CompletionTrigger::Manual, now)
    }

    /// Back to `NotStarted` with a fresh attempt id; answers, statuses and results are dropped.
    pub fn reset(&mut self) {
        self.store.clear();
        self.status.clear();
        self.nav.reset();
        self.results = None;
        self.started_at = None;
        self.remaining_secs = self.settings.duration_secs();
        self.attempt_id = AttemptId::generate();
        self.state = SessionState::NotStarted;
    }

    // Single check-and-set completion path shared by every trigger.
    fn complete(&mut self, trigger: CompletionTrigger, now: DateTime<Utc>) -> Option<ExamResults> {
        if self.state != SessionState::InProgress {
            return None;
        }
        self.state = SessionState::Completed;

        let answers = self.store.snapshot();
        let card = self.scoring.score_layout(&self.layout, &answers);
        let time_taken_secs = self
            .settings
            .duration_secs()
            .saturating_sub(self.remaining_secs);
        let context = SubmissionContext {
            attempt_id: self.attempt_id,
            assessment_id: self.assessment_id.clone(),
            trigger,
            time_taken_secs,
            timestamp: now,
        };
        let results = ExamResults::new(context, card, answers, self.layout.questions().to_vec());

        self.observer.completed(&results);
        self.results = Some(results.clone());
        Some(results)
    }

    fn ensure_in_progress(&self) -> Result<(), ExamError> {
        match self.state {
            SessionState::NotStarted => Err(ExamError::NotStarted),
            SessionState::InProgress => Ok(()),
            SessionState::Completed => Err(ExamError::Completed),
        }
    }
}
