//! Error types for progress-core.

use thiserror::Error;

/// Errors from scoring a submission.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AlignError {
    #[error("reference text contains no tokens")]
    InvalidReference,
}

/// Errors from next-word selection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    #[error("no candidate words in any selection tier")]
    NoCandidateWords,
}
