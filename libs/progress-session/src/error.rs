//! Error types for the session layer.

use progress_core::{AlignError, SelectError};
use thiserror::Error;

/// Failures surfaced by repository collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),

    #[error("optimistic update lost a race")]
    Conflict,
}

/// Errors from session orchestration.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Align(#[from] AlignError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error("no active session awaiting an answer")]
    NotAwaitingAnswer,
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
