//! # Persistence Seam
//!
//! Abstract contract for the two external calls the editor consumes: save
//! the whole tree, and upload one attachment to an already-persisted
//! question. The HTTP implementation lives with the surrounding app; this
//! crate ships only the trait plus an in-memory implementation for tests
//! and embedding.

use quizforge_model::{Quiz, QuestionId, QuizId, SectionId};
use std::sync::Mutex;
use thiserror::Error;

/// Transport-level failure from a backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

/// External persistence contract
///
/// `save_quiz` must return a tree with identical section/question
/// cardinality and order, with ids populated on every node that did not
/// already have one. The commit engine verifies this before resolving
/// attachments against the response.
#[allow(async_fn_in_trait)]
pub trait QuizBackend {
    /// Create or update the quiz, returning the resolved tree
    async fn save_quiz(&self, quiz: &Quiz) -> Result<Quiz, BackendError>;

    /// Associate one binary payload with an already-persisted question
    async fn upload_attachment(
        &self,
        question: QuestionId,
        payload: &[u8],
    ) -> Result<(), BackendError>;
}

/// In-memory backend: assigns sequential ids and records uploads
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    inner: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    next_id: u64,
    saved: Option<Quiz>,
    save_count: usize,
    uploads: Vec<(QuestionId, Vec<u8>)>,
}

impl InMemoryState {
    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last tree accepted by `save_quiz`, if any
    pub fn saved_quiz(&self) -> Option<Quiz> {
        self.inner.lock().unwrap().saved.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().unwrap().save_count
    }

    /// Every `(question, payload)` pair received so far, in arrival order
    pub fn uploads(&self) -> Vec<(QuestionId, Vec<u8>)> {
        self.inner.lock().unwrap().uploads.clone()
    }
}

impl QuizBackend for InMemoryBackend {
    async fn save_quiz(&self, quiz: &Quiz) -> Result<Quiz, BackendError> {
        let mut inner = self.inner.lock().unwrap();

        let mut resolved = quiz.clone();
        if resolved.id.is_none() {
            let id = inner.fresh_id();
            resolved.id = Some(QuizId(id));
            resolved.code = Some(format!("QZ-{id:04}"));
        }
        for section in &mut resolved.sections {
            if section.id.is_none() {
                section.id = Some(SectionId(inner.fresh_id()));
            }
            for question in &mut section.questions {
                if question.id.is_none() {
                    question.id = Some(QuestionId(inner.fresh_id()));
                }
            }
        }

        inner.saved = Some(resolved.clone());
        inner.save_count += 1;
        Ok(resolved)
    }

    async fn upload_attachment(
        &self,
        question: QuestionId,
        payload: &[u8],
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();

        let known = inner
            .saved
            .as_ref()
            .map(|quiz| {
                quiz.sections
                    .iter()
                    .flat_map(|s| &s.questions)
                    .any(|q| q.id == Some(question))
            })
            .unwrap_or(false);
        if !known {
            return Err(BackendError::Rejected(format!(
                "unknown question id {question}"
            )));
        }

        if let Some(quiz) = inner.saved.as_mut() {
            for section in &mut quiz.sections {
                for q in &mut section.questions {
                    if q.id == Some(question) {
                        q.image_path = Some(format!("attachments/{question}.png"));
                    }
                }
            }
        }

        inner.uploads.push((question, payload.to_vec()));
        Ok(())
    }
}
