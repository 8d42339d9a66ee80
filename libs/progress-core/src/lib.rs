//! Core learning-progress engine shared by session and service layers.
//!
//! Provides:
//! - Token-level answer scoring against a reference text (edit-distance
//!   alignment with typo tolerance)
//! - Per-word mastery tracking with a level-scaled review interval
//! - Bidirectional fixed-interval review ladder with a mastered terminal
//!   state
//! - Next-word selection over mastery state and frequency-ranked pools
//!
//! Everything here is pure: functions take the latest known state and a
//! clock value and return new values. Persistence and orchestration live in
//! `progress-session`.

pub mod align;
pub mod error;
pub mod schedule;
pub mod select;
pub mod types;

pub use align::{levenshtein_distance, score, tokenize};
pub use error::{AlignError, SelectError};
pub use schedule::mastery::{update_mastery, MasteryLadder};
pub use schedule::review::{
    advance_review, check_mastered, is_due, ReviewContext, ReviewLadder, MASTERY_ROUND,
};
pub use schedule::{get_ladder, IntervalLadder};
pub use select::{SelectorConfig, WordSelector};
pub use types::{
    AttemptResult, DifficultyLevel, Direction, DueDate, ExerciseStatus, Language, MasteryKey,
    PoolWord, ReviewEvent, SelectionReason, SelectionResult, TokenStatus, TokenVerdict,
    VerdictCounts, WordMasteryRecord, WordType,
};
