use std::sync::{Arc, Mutex};
use std::time::Duration;

use exam_core::model::{
    AnswerError, AnswerValue, Assessment, CompletionTrigger, CorrectAnswer, ExamResults,
    ExamSettings, MarkingScheme, Question, QuestionOption, Section, SectionKey,
};
use exam_core::time::fixed_now;
use exam_core::{ExamError, ExamObserver, QuestionStatus, SessionState, StatusKind};
use services::{Clock, ExamLoopService, ServiceConfig, SessionError};
use storage::repository::{
    AssessmentRepository, InMemoryRepository, ResultsRepository, StorageError,
};

fn gate_assessment() -> Assessment {
    let aptitude = Section {
        title: "General Aptitude".into(),
        questions: vec![
            Question::multiple_choice(
                "a1",
                "Pick the synonym of 'rapid'",
                vec![
                    QuestionOption::new("A", "slow"),
                    QuestionOption::new("B", "quick"),
                ],
                Some(CorrectAnswer::new("B")),
            )
            .with_topic("Verbal Aptitude - Synonyms"),
        ],
        ..Section::default()
    };
    let core = Section {
        title: "Computer Science".into(),
        questions: vec![
            Question::numerical("c1", "2^10", Some(CorrectAnswer::new("1024")))
                .with_topic("Discrete Maths - Powers"),
            Question::numerical("c2", "log2(8)", Some(CorrectAnswer::new("3"))),
        ],
        ..Section::default()
    };
    Assessment::new("gate-cs", "GATE CS Mock")
        .with_section(SectionKey::Aptitude, aptitude)
        .with_section(SectionKey::Core, core)
}

#[derive(Default)]
struct Events {
    changes: Vec<(usize, QuestionStatus)>,
    completions: Vec<ExamResults>,
}

struct Recorder(Arc<Mutex<Events>>);

impl ExamObserver for Recorder {
    fn answer_changed(&mut self, position: usize, status: QuestionStatus) {
        self.0.lock().unwrap().changes.push((position, status));
    }

    fn completed(&mut self, results: &ExamResults) {
        self.0.lock().unwrap().completions.push(results.clone());
    }
}

async fn service(duration_secs: u32) -> (ExamLoopService, InMemoryRepository) {
    let repo = InMemoryRepository::new();
    repo.upsert_assessment(&gate_assessment()).await.unwrap();
    let settings = ExamSettings::new(duration_secs, MarkingScheme::default()).unwrap();
    let service = ExamLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
    .with_settings(settings);
    (service, repo)
}

#[tokio::test(start_paused = true)]
async fn full_attempt_is_scored_and_stored() {
    let (service, _repo) = service(600).await;
    let events = Arc::new(Mutex::new(Events::default()));
    let mut runner = service
        .start_exam_with_observer("gate-cs", Box::new(Recorder(Arc::clone(&events))))
        .await
        .unwrap();

    runner.answer(AnswerValue::choice("B")).unwrap();
    runner.toggle_review().unwrap();
    runner.next().unwrap();
    runner.answer(AnswerValue::Numeric(1000.0)).unwrap();
    runner.jump_to(2).unwrap();
    runner.toggle_review().unwrap();

    let progress = runner.progress();
    assert_eq!(progress.total, 3);
    assert_eq!(progress.answered_and_marked, 1);
    assert_eq!(progress.answered, 1);
    assert_eq!(progress.marked_for_review, 1);
    assert_eq!(progress.state, SessionState::InProgress);
    assert_eq!(
        runner.view(|s| s.status_of(1).kind()),
        StatusKind::AnsweredAndMarked
    );

    let results = runner.submit().unwrap();
    assert_eq!(results.trigger(), CompletionTrigger::Manual);
    assert_eq!(results.correct_count(), 1);
    assert_eq!(results.incorrect_count(), 1);
    assert_eq!(results.unattempted_count(), 1);
    assert!((results.section_score(SectionKey::Aptitude).unwrap() - 1.5).abs() < 1e-9);
    // -0.5 floored at the section level.
    assert!(results.section_score(SectionKey::Core).unwrap().abs() < 1e-9);
    assert!((results.total_score() - 1.5).abs() < 1e-9);

    runner.wait_persisted().await.unwrap();
    let stored = service.latest_results().await.unwrap().expect("stored results");
    assert_eq!(stored, results);
    assert_eq!(service.results_history(10).await.unwrap().len(), 1);

    let events = events.lock().unwrap();
    assert_eq!(events.completions.len(), 1);
    assert_eq!(events.changes.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn submit_then_expiry_emits_results_once() {
    let (service, repo) = service(2).await;
    let events = Arc::new(Mutex::new(Events::default()));
    let mut runner = service
        .start_exam_with_observer("gate-cs", Box::new(Recorder(Arc::clone(&events))))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(runner.submit().is_some());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(runner.submit().is_none());

    runner.wait_persisted().await.unwrap();
    assert_eq!(events.lock().unwrap().completions.len(), 1);
    let stored = repo.list_results("gateExamResults", 10).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn expiry_completes_unanswered_attempt() {
    let (service, _repo) = service(2).await;
    let runner = service.start_exam("gate-cs").await.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(runner.is_complete());
    assert!(matches!(
        runner.answer(AnswerValue::choice("A")),
        Err(SessionError::Exam(ExamError::Completed))
    ));

    runner.wait_persisted().await.unwrap();
    let stored = service.latest_results().await.unwrap().unwrap();
    assert_eq!(stored.trigger(), CompletionTrigger::TimeExpired);
    assert_eq!(stored.unattempted_count(), 3);
    assert!(stored.total_score().abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn missing_and_empty_assessments_are_rejected() {
    let (service, repo) = service(60).await;
    assert!(matches!(
        service.start_exam("nope").await,
        Err(SessionError::Storage(StorageError::NotFound))
    ));

    repo.upsert_assessment(&Assessment::new("empty", "Empty"))
        .await
        .unwrap();
    assert!(matches!(
        service.start_exam("empty").await,
        Err(SessionError::Exam(ExamError::NoQuestions))
    ));
}

#[tokio::test]
async fn bootstrap_uses_configured_database_and_key() {
    let config = ServiceConfig::from_lookup(|key| match key {
        "EXAM_DB_URL" => Some("sqlite:file:memdb_services_smoke?mode=memory&cache=shared".into()),
        "EXAM_RESULTS_KEY" => Some("mockResults".into()),
        "EXAM_DURATION_SECS" => Some("900".into()),
        _ => None,
    })
    .unwrap();
    let service = ExamLoopService::bootstrap(&config, Clock::fixed(fixed_now()))
        .await
        .unwrap();
    assert_eq!(service.settings().duration_secs(), 900);
    assert!(service.latest_results().await.unwrap().is_none());
    assert!(matches!(
        service.start_exam("gate-cs").await,
        Err(SessionError::Storage(StorageError::NotFound))
    ));
}

#[tokio::test]
async fn non_finite_numeric_answer_cannot_poison_sqlite_history() {
    let storage = storage::repository::Storage::sqlite(
        "sqlite:file:memdb_services_non_finite?mode=memory&cache=shared",
    )
    .await
    .unwrap();
    storage
        .assessments
        .upsert_assessment(&gate_assessment())
        .await
        .unwrap();
    let service = ExamLoopService::from_storage(Clock::fixed(fixed_now()), &storage);

    let mut runner = service.start_exam("gate-cs").await.unwrap();
    runner.jump_to(1).unwrap();
    assert!(matches!(
        runner.answer(AnswerValue::Numeric(f64::NAN)),
        Err(SessionError::Exam(ExamError::Answer(AnswerError::InvalidNumeric(_))))
    ));
    assert!(matches!(
        runner.answer(AnswerValue::Numeric(f64::INFINITY)),
        Err(SessionError::Exam(ExamError::Answer(_)))
    ));
    assert!(!runner.view(|s| s.status_of(2).answered));
    runner.answer(AnswerValue::Numeric(1024.0)).unwrap();

    let results = runner.submit().unwrap();
    runner.wait_persisted().await.unwrap();

    let stored = service.latest_results().await.unwrap().expect("stored results");
    assert_eq!(stored, results);
    assert_eq!(stored.correct_count(), 1);
    assert_eq!(service.results_history(10).await.unwrap().len(), 1);
}
