//! Repository traits the engine consumes.
//!
//! Storage is owned by external collaborators; the engine's contract is
//! "apply this delta atomically keyed by (user, word, language)".
//! [`WordRepository::upsert_mastery`] is a compare-and-swap on the record's
//! `version` field and must reject stale writes with
//! [`RepositoryError::Conflict`] instead of clobbering history.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use progress_core::{
    DifficultyLevel, Direction, ExerciseStatus, Language, MasteryKey, PoolWord, ReviewEvent,
    WordMasteryRecord,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryError;

type Result<T> = std::result::Result<T, RepositoryError>;

/// Aggregate outcome of one practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_attempts: u32,
    pub total_correct: u32,
    pub ended_at: DateTime<Utc>,
}

/// Storage for word mastery records.
#[async_trait]
pub trait WordRepository: Send + Sync {
    async fn get_mastery(&self, key: &MasteryKey) -> Result<Option<WordMasteryRecord>>;

    /// Records with `next_review_date <= today` for this user and language.
    async fn get_due_words(
        &self,
        user_id: Uuid,
        language: Language,
        today: NaiveDate,
    ) -> Result<Vec<WordMasteryRecord>>;

    /// Conditional upsert: succeeds only when `record.version` matches the
    /// stored version (0 for a new key); bumps the version on success.
    async fn upsert_mastery(&self, record: &WordMasteryRecord) -> Result<()>;
}

/// Storage for bidirectional exercises and their review log.
#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    async fn get_review_events(
        &self,
        exercise_id: Uuid,
        direction: Direction,
    ) -> Result<Vec<ReviewEvent>>;

    async fn append_review_event(&self, event: &ReviewEvent) -> Result<()>;

    async fn get_exercise_status(&self, exercise_id: Uuid) -> Result<ExerciseStatus>;

    async fn set_exercise_status(&self, exercise_id: Uuid, status: ExerciseStatus) -> Result<()>;
}

/// Supplies frequency-ranked word pools per language and difficulty.
#[async_trait]
pub trait WordPoolProvider: Send + Sync {
    async fn ranked_pool(
        &self,
        language: Language,
        difficulty: DifficultyLevel,
    ) -> Result<Vec<PoolWord>>;
}

/// Storage for per-session aggregates.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn save_summary(&self, user_id: Uuid, summary: &SessionSummary) -> Result<()>;
}

// Delegating impls so shared handles (Arc) can be handed to the coordinator
// while the caller keeps one.

#[async_trait]
impl<T: WordRepository + ?Sized> WordRepository for Arc<T> {
    async fn get_mastery(&self, key: &MasteryKey) -> Result<Option<WordMasteryRecord>> {
        (**self).get_mastery(key).await
    }

    async fn get_due_words(
        &self,
        user_id: Uuid,
        language: Language,
        today: NaiveDate,
    ) -> Result<Vec<WordMasteryRecord>> {
        (**self).get_due_words(user_id, language, today).await
    }

    async fn upsert_mastery(&self, record: &WordMasteryRecord) -> Result<()> {
        (**self).upsert_mastery(record).await
    }
}

#[async_trait]
impl<T: ExerciseRepository + ?Sized> ExerciseRepository for Arc<T> {
    async fn get_review_events(
        &self,
        exercise_id: Uuid,
        direction: Direction,
    ) -> Result<Vec<ReviewEvent>> {
        (**self).get_review_events(exercise_id, direction).await
    }

    async fn append_review_event(&self, event: &ReviewEvent) -> Result<()> {
        (**self).append_review_event(event).await
    }

    async fn get_exercise_status(&self, exercise_id: Uuid) -> Result<ExerciseStatus> {
        (**self).get_exercise_status(exercise_id).await
    }

    async fn set_exercise_status(&self, exercise_id: Uuid, status: ExerciseStatus) -> Result<()> {
        (**self).set_exercise_status(exercise_id, status).await
    }
}

#[async_trait]
impl<T: WordPoolProvider + ?Sized> WordPoolProvider for Arc<T> {
    async fn ranked_pool(
        &self,
        language: Language,
        difficulty: DifficultyLevel,
    ) -> Result<Vec<PoolWord>> {
        (**self).ranked_pool(language, difficulty).await
    }
}

#[async_trait]
impl<T: SessionRepository + ?Sized> SessionRepository for Arc<T> {
    async fn save_summary(&self, user_id: Uuid, summary: &SessionSummary) -> Result<()> {
        (**self).save_summary(user_id, summary).await
    }
}
