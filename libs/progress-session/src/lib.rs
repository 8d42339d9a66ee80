//! Session orchestration for the learning-progress engine.
//!
//! Wraps the pure `progress-core` engine with:
//! - async repository traits for the storage collaborators
//! - a session coordinator driving the pick/score/update loop
//! - a retry-then-queue policy so flaky storage never stalls a session
//! - in-memory repository implementations for tests and reference

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod repository;

pub use coordinator::{
    AttemptOutcome, ExerciseKind, PresentedExercise, SessionConfig, SessionCoordinator,
    SessionPhase, SessionState,
};
pub use error::{RepositoryError, Result, SessionError};
pub use memory::{
    MemoryExerciseRepository, MemorySessionRepository, MemoryWordRepository, StaticWordPool,
};
pub use repository::{
    ExerciseRepository, SessionRepository, SessionSummary, WordPoolProvider, WordRepository,
};
