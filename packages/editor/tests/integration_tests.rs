//! End-to-end commit tests: validate → save → resolve → upload

use quizforge_editor::{
    BackendError, CommitEngine, CommitError, EditSession, InMemoryBackend, Mutation, PositionKey,
    QuestionId, Quiz, QuizBackend, QuizId, SectionId, ShapeError,
};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Backend with scripted save responses and per-question upload failures
#[derive(Default)]
struct ScriptedBackend {
    save_responses: Mutex<VecDeque<Result<Quiz, BackendError>>>,
    saves: Mutex<Vec<Quiz>>,
    failing_uploads: Mutex<HashSet<QuestionId>>,
    uploads: Mutex<Vec<(QuestionId, Vec<u8>)>>,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self::default()
    }

    fn push_save_response(&self, response: Result<Quiz, BackendError>) {
        self.save_responses.lock().unwrap().push_back(response);
    }

    fn fail_upload(&self, question: QuestionId) {
        self.failing_uploads.lock().unwrap().insert(question);
    }

    fn clear_upload_failures(&self) {
        self.failing_uploads.lock().unwrap().clear();
    }

    fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    fn uploads(&self) -> Vec<(QuestionId, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }
}

impl QuizBackend for ScriptedBackend {
    async fn save_quiz(&self, quiz: &Quiz) -> Result<Quiz, BackendError> {
        self.saves.lock().unwrap().push(quiz.clone());
        self.save_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted save response left")
    }

    async fn upload_attachment(
        &self,
        question: QuestionId,
        payload: &[u8],
    ) -> Result<(), BackendError> {
        if self.failing_uploads.lock().unwrap().contains(&question) {
            return Err(BackendError::Transport(format!(
                "upload of question {question} timed out"
            )));
        }
        self.uploads.lock().unwrap().push((question, payload.to_vec()));
        Ok(())
    }
}

/// One section with `count` answered single-choice questions
fn authored_session(count: usize) -> EditSession {
    let mut session = EditSession::new(Quiz::new("Rust basics"));
    session
        .apply(Mutation::AddSection { name: "Ownership".into() })
        .unwrap();
    for question in 0..count {
        session.apply(Mutation::AddQuestion { section: 0 }).unwrap();
        session
            .apply(Mutation::SetPrompt {
                section: 0,
                question,
                prompt: format!("Prompt {question}"),
            })
            .unwrap();
        for text in ["A", "B"] {
            session
                .apply(Mutation::AddOption { section: 0, question, text: text.into() })
                .unwrap();
        }
        session
            .apply(Mutation::SetOptionSelected {
                section: 0,
                question,
                option: 0,
                selected: true,
            })
            .unwrap();
    }
    session
}

/// Same-shaped copy of `quiz` with ids filled in; question ids count up
/// from `first_question_id`
fn resolved_from(quiz: &Quiz, first_question_id: u64) -> Quiz {
    let mut resolved = quiz.clone();
    if resolved.id.is_none() {
        resolved.id = Some(QuizId(1));
        resolved.code = Some("QZ-0001".into());
    }
    let mut next = first_question_id;
    for (index, section) in resolved.sections.iter_mut().enumerate() {
        if section.id.is_none() {
            section.id = Some(SectionId(100 + index as u64));
        }
        for question in &mut section.questions {
            if question.id.is_none() {
                question.id = Some(QuestionId(next));
                next += 1;
            }
        }
    }
    resolved
}

#[tokio::test]
async fn test_validation_failure_blocks_save() {
    let backend = ScriptedBackend::new();
    let engine = CommitEngine::new(backend);

    let mut session = authored_session(1);
    session
        .apply(Mutation::SetOptionSelected { section: 0, question: 0, option: 0, selected: false })
        .unwrap();

    let err = engine.submit(&mut session).await.unwrap_err();
    match err {
        CommitError::Invalid(issues) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].position, Some(PositionKey::new(0, 0)));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(engine.backend().save_count(), 0);
}

#[tokio::test]
async fn test_submit_installs_server_confirmed_tree() {
    let engine = CommitEngine::new(InMemoryBackend::new());
    let mut session = authored_session(2);
    let version_before = session.version();

    let report = engine.submit(&mut session).await.unwrap();

    assert!(report.uploaded.is_empty());
    assert!(report.failed_uploads.is_empty());
    assert_eq!(report.version, version_before + 1);

    let quiz = session.quiz();
    assert!(quiz.id.is_some());
    assert!(quiz.code.is_some());
    assert!(quiz.sections[0].id.is_some());
    assert!(quiz.sections[0].questions.iter().all(|q| q.id.is_some()));
}

#[tokio::test]
async fn test_attachment_resolves_by_position() {
    let backend = ScriptedBackend::new();
    let mut session = authored_session(2);
    backend.push_save_response(Ok(resolved_from(session.quiz(), 41)));
    let engine = CommitEngine::new(backend);

    let payload = vec![0xFF, 0xD8, 0xFF];
    session.attach_image(0, 1, payload.clone()).unwrap();

    let report = engine.submit(&mut session).await.unwrap();

    // Exactly one upload, bound to the id the response placed at (0, 1);
    // question (0, 0) gets no call.
    assert_eq!(engine.backend().uploads(), vec![(QuestionId(42), payload)]);
    assert_eq!(report.uploaded, vec![PositionKey::new(0, 1)]);
    assert!(session.ledger().is_empty());
    assert_eq!(session.quiz().question(0, 1).unwrap().id, Some(QuestionId(42)));
}

#[tokio::test]
async fn test_save_failure_leaves_state_untouched() {
    let backend = ScriptedBackend::new();
    backend.push_save_response(Err(BackendError::Transport("connection reset".into())));
    let engine = CommitEngine::new(backend);

    let mut session = authored_session(2);
    session.attach_image(0, 0, vec![1, 2]).unwrap();
    let quiz_before = session.quiz().clone();
    let ledger_before = session.ledger().clone();
    let version_before = session.version();

    let err = engine.submit(&mut session).await.unwrap_err();

    assert!(matches!(err, CommitError::Save(BackendError::Transport(_))));
    assert!(engine.backend().uploads().is_empty());
    assert_eq!(session.quiz(), &quiz_before);
    assert_eq!(session.ledger(), &ledger_before);
    assert_eq!(session.version(), version_before);
}

#[tokio::test]
async fn test_reshaped_response_aborts_before_upload() {
    let backend = ScriptedBackend::new();
    let mut session = authored_session(1);
    session.attach_image(0, 0, vec![9]).unwrap();

    let mut reshaped = resolved_from(session.quiz(), 41);
    let extra = reshaped.sections[0].questions[0].clone();
    reshaped.sections[0].questions.push(extra);
    backend.push_save_response(Ok(reshaped));
    let engine = CommitEngine::new(backend);

    let quiz_before = session.quiz().clone();
    let err = engine.submit(&mut session).await.unwrap_err();

    assert!(matches!(
        err,
        CommitError::ShapeMismatch(ShapeError::QuestionCount { section: 0, expected: 1, returned: 2 })
    ));
    assert!(engine.backend().uploads().is_empty());
    assert_eq!(session.quiz(), &quiz_before);
    assert!(session.ledger().contains(PositionKey::new(0, 0)));
}

#[tokio::test]
async fn test_partial_upload_failure_degrades_gracefully() {
    let backend = ScriptedBackend::new();
    let mut session = authored_session(2);
    backend.push_save_response(Ok(resolved_from(session.quiz(), 41)));
    backend.fail_upload(QuestionId(41));
    let engine = CommitEngine::new(backend);

    session.attach_image(0, 0, vec![0]).unwrap();
    session.attach_image(0, 1, vec![1]).unwrap();

    let report = engine.submit(&mut session).await.unwrap();

    // The tree is saved either way; only the failed question keeps its
    // staged payload.
    assert_eq!(report.uploaded, vec![PositionKey::new(0, 1)]);
    assert_eq!(report.failed_uploads.len(), 1);
    assert_eq!(report.failed_uploads[0].position, PositionKey::new(0, 0));
    assert_eq!(report.failed_uploads[0].question, QuestionId(41));
    assert!(session.quiz().id.is_some());
    assert!(session.ledger().contains(PositionKey::new(0, 0)));
    assert!(!session.ledger().contains(PositionKey::new(0, 1)));
}

#[tokio::test]
async fn test_resubmit_retries_only_missing_uploads() {
    let backend = ScriptedBackend::new();
    let mut session = authored_session(2);
    backend.push_save_response(Ok(resolved_from(session.quiz(), 41)));
    backend.fail_upload(QuestionId(41));
    let engine = CommitEngine::new(backend);

    session.attach_image(0, 0, vec![0]).unwrap();
    session.attach_image(0, 1, vec![1]).unwrap();
    engine.submit(&mut session).await.unwrap();

    // User resubmits once the transport recovers; ids are already
    // assigned, so the second response is the tree as-is.
    engine.backend().clear_upload_failures();
    engine.backend().push_save_response(Ok(session.quiz().clone()));

    let report = engine.submit(&mut session).await.unwrap();

    assert_eq!(report.uploaded, vec![PositionKey::new(0, 0)]);
    assert!(report.failed_uploads.is_empty());
    assert!(session.ledger().is_empty());

    let uploads = engine.backend().uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[1], (QuestionId(41), vec![0]));
}

/// Backend whose save call parks until the test releases it
struct GatedBackend {
    gate: tokio::sync::Semaphore,
    inner: InMemoryBackend,
}

impl GatedBackend {
    fn new() -> Self {
        Self {
            gate: tokio::sync::Semaphore::new(0),
            inner: InMemoryBackend::new(),
        }
    }
}

impl QuizBackend for GatedBackend {
    async fn save_quiz(&self, quiz: &Quiz) -> Result<Quiz, BackendError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        self.inner.save_quiz(quiz).await
    }

    async fn upload_attachment(
        &self,
        question: QuestionId,
        payload: &[u8],
    ) -> Result<(), BackendError> {
        self.inner.upload_attachment(question, payload).await
    }
}

#[tokio::test]
async fn test_overlapping_submit_is_rejected() {
    let engine = Arc::new(CommitEngine::new(GatedBackend::new()));

    let mut first = authored_session(1);
    let background = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.submit(&mut first).await.map(|report| (report, first)) })
    };

    // Wait for the first submit to park inside the save call.
    while !engine.is_in_flight() {
        tokio::task::yield_now().await;
    }

    let mut second = authored_session(1);
    let err = engine.submit(&mut second).await.unwrap_err();
    assert!(matches!(err, CommitError::InFlight));

    engine.backend().gate.add_permits(1);
    let (report, first) = background.await.unwrap().unwrap();
    assert!(report.failed_uploads.is_empty());
    assert!(first.quiz().id.is_some());
    assert!(!engine.is_in_flight());
}
