//! # Commit Engine
//!
//! Two-phase save with positional attachment resolution.
//!
//! ```text
//! Idle ──submit──▶ validate ──▶ Persisting ──▶ Resolving ──▶ Uploading ──▶ Idle
//!                     │              │              │
//!                     │ issues       │ transport    │ shape mismatch
//!                     ▼              ▼              ▼
//!                   Idle (session untouched on every failure before upload)
//! ```
//!
//! The tree is saved without binary payloads; the response must preserve
//! section/question cardinality and order, with ids populated. Attachments
//! are then resolved purely by position: the payload staged at `(s, q)` is
//! uploaded to `resolved.sections[s].questions[q].id`. The engine verifies
//! the shape contract before resolving, so a reordering or reshaping
//! response aborts the submit instead of silently binding payloads to the
//! wrong question.
//!
//! Uploads are issued concurrently and are independent: no ordering, no
//! atomicity, no rollback of the tree save. A failed upload leaves its
//! ledger entry in place (the key is still valid, the resolved tree is
//! same-shaped), so resubmitting retries just the missing images.

use crate::backend::{BackendError, QuizBackend};
use crate::ledger::PositionKey;
use crate::session::EditSession;
use crate::validate::ValidationIssue;
use futures_util::future::join_all;
use quizforge_model::{QuestionId, Quiz};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a submit attempt was aborted before the tree was saved
#[derive(Error, Debug)]
pub enum CommitError {
    /// Local validation failed; no network call was made
    #[error("quiz failed validation with {} issue(s)", .0.len())]
    Invalid(Vec<ValidationIssue>),

    /// The save call failed; tree and ledger are untouched, retry is safe
    #[error("save failed: {0}")]
    Save(#[from] BackendError),

    /// The save response broke the shape contract; tree and ledger are
    /// untouched, no upload was attempted
    #[error("saved tree does not match the submitted shape: {0}")]
    ShapeMismatch(#[from] ShapeError),

    /// A submit is already in flight on this engine
    #[error("a submit is already in flight")]
    InFlight,
}

/// How the save response deviated from the submitted tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("expected {expected} sections, server returned {returned}")]
    SectionCount { expected: usize, returned: usize },

    #[error("section {section}: expected {expected} questions, server returned {returned}")]
    QuestionCount {
        section: usize,
        expected: usize,
        returned: usize,
    },

    #[error("section {section} has no id after save")]
    MissingSectionId { section: usize },

    #[error("question {position} has no id after save")]
    MissingQuestionId { position: PositionKey },
}

/// One attachment that could not be uploaded ("saved, image not attached")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub position: PositionKey,
    pub question: QuestionId,
    pub error: BackendError,
}

/// Outcome of a settled submit: the tree is saved, uploads may have
/// partially failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Session version after installing the server-confirmed tree
    pub version: u64,

    /// Positions whose attachment uploaded and left the ledger
    pub uploaded: Vec<PositionKey>,

    /// Per-question upload failures; their ledger entries remain staged
    pub failed_uploads: Vec<UploadFailure>,
}

/// Sequences save → resolve → upload for one editing session
pub struct CommitEngine<B> {
    backend: B,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag even if the submit future is dropped mid-cycle
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<B: QuizBackend> CommitEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Drive one full submit cycle; resolves once the engine is Idle again.
    ///
    /// Overlapping submits are rejected with [`CommitError::InFlight`]
    /// rather than raced.
    pub async fn submit(&self, session: &mut EditSession) -> Result<CommitReport, CommitError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(CommitError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);
        self.run(session).await
    }

    async fn run(&self, session: &mut EditSession) -> Result<CommitReport, CommitError> {
        let issues = session.validate();
        if !issues.is_empty() {
            debug!(issues = issues.len(), "submit blocked by validation");
            return Err(CommitError::Invalid(issues));
        }

        info!(
            sections = session.quiz().sections.len(),
            pending_attachments = session.ledger().len(),
            "persisting quiz tree"
        );
        let resolved = self.backend.save_quiz(session.quiz()).await?;

        verify_shape(session.quiz(), &resolved)?;

        // Each upload captures its own (id, payload) pair here, before any
        // call is issued; later edits cannot retarget them.
        let mut planned = Vec::with_capacity(session.ledger().len());
        for (key, attachment) in session.ledger().iter() {
            let question = resolved
                .sections
                .get(key.section)
                .and_then(|s| s.questions.get(key.question))
                .and_then(|q| q.id)
                .ok_or(ShapeError::MissingQuestionId { position: *key })?;
            planned.push((*key, question, attachment.payload.clone()));
        }

        let uploads = planned.iter().map(|(key, question, payload)| async move {
            debug!(%key, %question, bytes = payload.len(), "uploading attachment");
            let result = self.backend.upload_attachment(*question, payload).await;
            (*key, *question, result)
        });
        let settled = join_all(uploads).await;

        let mut uploaded = Vec::new();
        let mut failed_uploads = Vec::new();
        for (position, question, result) in settled {
            match result {
                Ok(()) => uploaded.push(position),
                Err(error) => {
                    warn!(%position, %question, error = %error, "attachment upload failed");
                    failed_uploads.push(UploadFailure {
                        position,
                        question,
                        error,
                    });
                }
            }
        }

        let version = session.complete_submit(resolved, &uploaded);
        info!(
            version,
            uploaded = uploaded.len(),
            failed = failed_uploads.len(),
            "submit settled"
        );
        Ok(CommitReport {
            version,
            uploaded,
            failed_uploads,
        })
    }
}

/// Check that the response preserves the submitted tree's shape and carries
/// an id on every node
fn verify_shape(submitted: &Quiz, resolved: &Quiz) -> Result<(), ShapeError> {
    if submitted.sections.len() != resolved.sections.len() {
        return Err(ShapeError::SectionCount {
            expected: submitted.sections.len(),
            returned: resolved.sections.len(),
        });
    }

    for (index, (ours, theirs)) in submitted
        .sections
        .iter()
        .zip(resolved.sections.iter())
        .enumerate()
    {
        if ours.questions.len() != theirs.questions.len() {
            return Err(ShapeError::QuestionCount {
                section: index,
                expected: ours.questions.len(),
                returned: theirs.questions.len(),
            });
        }
        if theirs.id.is_none() {
            return Err(ShapeError::MissingSectionId { section: index });
        }
        for (question_index, question) in theirs.questions.iter().enumerate() {
            if question.id.is_none() {
                return Err(ShapeError::MissingQuestionId {
                    position: PositionKey::new(index, question_index),
                });
            }
        }
    }

    Ok(())
}
