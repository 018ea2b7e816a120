//! # Quizforge Editor
//!
//! Core authoring engine for quiz trees.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Quiz → Sections → Questions → Options│
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session + mutations + ledger        │
//! │  - Apply mutations with positional checks   │
//! │  - Stage attachments by tree position       │
//! │  - Validate per-question invariants         │
//! │  - Commit: save → resolve → upload          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ backend: save tree / upload attachment      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth**: binary payloads live beside it
//!    in a positional ledger, never inside it
//! 2. **Mutations are infallible on valid positions**: semantic invalidity
//!    is caught by validation at submit time, not mid-edit
//! 3. **Two-phase commit**: questions get ids only from the save response;
//!    attachments resolve against that response by position, then upload
//! 4. **No partial save of an invalid tree**: validation and save failures
//!    abort before any upload; upload failures degrade gracefully
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quizforge_editor::{CommitEngine, EditSession, InMemoryBackend, Mutation, Quiz};
//!
//! let mut session = EditSession::new(Quiz::new("Rust basics"));
//! session.apply(Mutation::AddSection { name: "Ownership".into() })?;
//! session.apply(Mutation::AddQuestion { section: 0 })?;
//! session.attach_image(0, 0, image_bytes)?;
//!
//! let mut engine = CommitEngine::new(InMemoryBackend::new());
//! let report = engine.submit(&mut session).await?;
//! assert!(report.failed_uploads.is_empty());
//! ```

mod backend;
mod commit;
mod errors;
mod ledger;
mod mutations;
mod session;
mod validate;

pub use backend::{BackendError, InMemoryBackend, QuizBackend};
pub use commit::{CommitEngine, CommitError, CommitReport, ShapeError, UploadFailure};
pub use errors::EditorError;
pub use ledger::{AttachmentLedger, PendingAttachment, PositionKey};
pub use mutations::{Mutation, MutationError};
pub use session::EditSession;
pub use validate::{validate_quiz, ValidationIssue, ValidationRule};

// Re-export model types for convenience
pub use quizforge_model::{
    AnswerOption, Question, QuestionId, QuestionKind, Quiz, QuizId, Section, SectionId,
};
