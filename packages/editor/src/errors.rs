//! Error types for the editor

use thiserror::Error;

/// Umbrella error for embedders that drive editing and submit through one
/// fallible surface
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Commit error: {0}")]
    Commit(#[from] crate::commit::CommitError),

    #[error("Backend error: {0}")]
    Backend(#[from] crate::backend::BackendError),
}
