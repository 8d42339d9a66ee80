//! In-memory repository implementations.
//!
//! Reference implementations of the storage contracts, used by the
//! integration tests. Real adapters must preserve the same version-CAS
//! semantics on mastery upserts.

use async_trait::async_trait;
use chrono::NaiveDate;
use progress_core::{
    DifficultyLevel, Direction, ExerciseStatus, Language, MasteryKey, PoolWord, ReviewEvent,
    WordMasteryRecord,
};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::repository::{
    ExerciseRepository, SessionRepository, SessionSummary, WordPoolProvider, WordRepository,
};

type Result<T> = std::result::Result<T, RepositoryError>;

/// In-memory mastery store with version CAS.
#[derive(Debug, Default)]
pub struct MemoryWordRepository {
    records: Mutex<HashMap<MasteryKey, WordMasteryRecord>>,
}

impl MemoryWordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read of a stored record, bypassing the trait (test helper).
    pub fn stored(&self, key: &MasteryKey) -> Option<WordMasteryRecord> {
        self.records.lock().expect("records lock").get(key).cloned()
    }
}

#[async_trait]
impl WordRepository for MemoryWordRepository {
    async fn get_mastery(&self, key: &MasteryKey) -> Result<Option<WordMasteryRecord>> {
        Ok(self.records.lock().expect("records lock").get(key).cloned())
    }

    async fn get_due_words(
        &self,
        user_id: Uuid,
        language: Language,
        today: NaiveDate,
    ) -> Result<Vec<WordMasteryRecord>> {
        let records = self.records.lock().expect("records lock");
        Ok(records
            .values()
            .filter(|r| r.user_id == user_id && r.language == language && r.is_due(today))
            .cloned()
            .collect())
    }

    async fn upsert_mastery(&self, record: &WordMasteryRecord) -> Result<()> {
        let mut records = self.records.lock().expect("records lock");
        let key = record.key();
        let stored_version = records.get(&key).map(|r| r.version).unwrap_or(0);
        if record.version != stored_version {
            return Err(RepositoryError::Conflict);
        }
        let mut accepted = record.clone();
        accepted.version += 1;
        records.insert(key, accepted);
        Ok(())
    }
}

/// In-memory exercise store: append-only event log plus a status map.
#[derive(Debug, Default)]
pub struct MemoryExerciseRepository {
    events: Mutex<Vec<ReviewEvent>>,
    statuses: Mutex<HashMap<Uuid, ExerciseStatus>>,
}

impl MemoryExerciseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExerciseRepository for MemoryExerciseRepository {
    async fn get_review_events(
        &self,
        exercise_id: Uuid,
        direction: Direction,
    ) -> Result<Vec<ReviewEvent>> {
        let events = self.events.lock().expect("events lock");
        Ok(events
            .iter()
            .filter(|e| e.exercise_id == exercise_id && e.direction == direction)
            .cloned()
            .collect())
    }

    async fn append_review_event(&self, event: &ReviewEvent) -> Result<()> {
        self.events.lock().expect("events lock").push(event.clone());
        Ok(())
    }

    async fn get_exercise_status(&self, exercise_id: Uuid) -> Result<ExerciseStatus> {
        let statuses = self.statuses.lock().expect("statuses lock");
        Ok(statuses.get(&exercise_id).copied().unwrap_or_default())
    }

    async fn set_exercise_status(&self, exercise_id: Uuid, status: ExerciseStatus) -> Result<()> {
        self.statuses
            .lock()
            .expect("statuses lock")
            .insert(exercise_id, status);
        Ok(())
    }
}

/// Static word pool provider backed by a fixed list.
#[derive(Debug, Default)]
pub struct StaticWordPool {
    pool: Vec<PoolWord>,
}

impl StaticWordPool {
    pub fn new(pool: Vec<PoolWord>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WordPoolProvider for StaticWordPool {
    async fn ranked_pool(
        &self,
        _language: Language,
        difficulty: DifficultyLevel,
    ) -> Result<Vec<PoolWord>> {
        Ok(self
            .pool
            .iter()
            .filter(|w| difficulty.admits(w.difficulty))
            .cloned()
            .collect())
    }
}

/// In-memory session summary store.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    summaries: Mutex<Vec<(Uuid, SessionSummary)>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries_for(&self, user_id: Uuid) -> Vec<SessionSummary> {
        self.summaries
            .lock()
            .expect("summaries lock")
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, s)| *s)
            .collect()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn save_summary(&self, user_id: Uuid, summary: &SessionSummary) -> Result<()> {
        self.summaries
            .lock()
            .expect("summaries lock")
            .push((user_id, *summary));
        Ok(())
    }
}
