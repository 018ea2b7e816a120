//! # Edit Session
//!
//! Owns one quiz tree and one attachment ledger for the duration of an
//! authoring session, and is their only writer.
//!
//! Every edit goes through `apply`, which keeps the ledger's positional
//! keys aligned with the tree (removals drop and re-key entries in the
//! same step). Attachments are picked up through `attach_image`, which
//! refuses positions that do not exist in the tree, so ledger keys are
//! valid tree positions at every point outside an active mutation.

use crate::ledger::{AttachmentLedger, PendingAttachment, PositionKey};
use crate::mutations::{Mutation, MutationError};
use crate::validate::{validate_quiz, ValidationIssue};
use quizforge_model::Quiz;
use tracing::debug;

/// Single-user editing state for one quiz
#[derive(Debug, Clone)]
pub struct EditSession {
    quiz: Quiz,
    ledger: AttachmentLedger,

    /// Increments on each applied mutation and on each installed save
    version: u64,
}

impl EditSession {
    /// Start a session over an existing tree (empty `Quiz::new(..)` for a
    /// brand new quiz)
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            ledger: AttachmentLedger::new(),
            version: 0,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn ledger(&self) -> &AttachmentLedger {
        &self.ledger
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply one mutation; returns the new session version
    pub fn apply(&mut self, mutation: Mutation) -> Result<u64, MutationError> {
        debug!(?mutation, version = self.version, "applying mutation");
        mutation.apply(&mut self.quiz, &mut self.ledger)?;
        self.version += 1;
        Ok(self.version)
    }

    /// Stage an image for the question at `(section, question)`.
    ///
    /// Replaces any previously staged image for that question. The position
    /// must exist in the current tree.
    pub fn attach_image(
        &mut self,
        section: usize,
        question: usize,
        payload: Vec<u8>,
    ) -> Result<(), MutationError> {
        if self.quiz.question(section, question).is_none() {
            return Err(if section >= self.quiz.sections.len() {
                MutationError::SectionOutOfRange(section)
            } else {
                MutationError::QuestionOutOfRange(section, question)
            });
        }
        let key = PositionKey::new(section, question);
        debug!(%key, bytes = payload.len(), "staging attachment");
        self.ledger.attach(key, payload);
        Ok(())
    }

    /// Discard a staged image (the user cleared the picked file)
    pub fn detach_image(&mut self, section: usize, question: usize) -> Option<PendingAttachment> {
        self.ledger.detach(PositionKey::new(section, question))
    }

    /// Run submit-time validation over the current tree
    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate_quiz(&self.quiz)
    }

    /// Install the server-confirmed tree after a successful save and drop
    /// the ledger entries that uploaded. Called by the commit engine only.
    pub(crate) fn complete_submit(&mut self, resolved: Quiz, uploaded: &[PositionKey]) -> u64 {
        self.quiz = resolved;
        for key in uploaded {
            self.ledger.detach(*key);
        }
        self.version += 1;
        self.version
    }
}
