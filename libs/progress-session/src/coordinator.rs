//! One practice session, from first word to summary.
//!
//! The coordinator owns all transient session state (exclusions, attempt
//! totals) and drives the pure engine: pick a target, score the submitted
//! answer, apply mastery and ladder updates, pick the next target.
//!
//! Mastery writes are read-modify-write against the latest stored record.
//! A failed or conflicted write is retried once from a fresh read; after
//! that the computed record is kept in an in-session overlay and queued so
//! the learner's session never blocks on storage.

use chrono::{DateTime, Utc};
use progress_core::schedule::review::{advance_review, check_mastered, ReviewContext};
use progress_core::{
    score, update_mastery, AttemptResult, DifficultyLevel, Direction, ExerciseStatus, Language,
    MasteryKey, ReviewEvent, SelectionResult, SelectorConfig, WordMasteryRecord, WordSelector,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{RepositoryError, Result, SessionError};
use crate::repository::{
    ExerciseRepository, SessionRepository, SessionSummary, WordPoolProvider, WordRepository,
};

/// Phase of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    AwaitingAnswer,
    Scoring,
    Updating,
    Ended,
}

/// How a submitted answer is judged correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    /// The answer must equal the blanked target word (case-insensitive).
    ClozeWord,
    /// Full-sentence dictation; correct when accuracy reaches the
    /// configured threshold.
    Dictation,
}

/// The exercise shown to the learner for the current target word. Exercise
/// text comes from outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentedExercise {
    pub reference_text: String,
    pub kind: ExerciseKind,
    /// Set for bidirectional review exercises.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<(Uuid, Direction)>,
}

/// Session tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Dictation accuracy (percent) required to count as correct.
    pub dictation_threshold: f64,
    /// Session ends after this many attempts.
    pub max_exercises: u32,
    pub selector: SelectorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dictation_threshold: 95.0,
            max_exercises: 10,
            selector: SelectorConfig::default(),
        }
    }
}

/// Transient per-session state; discarded when the session ends.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub difficulty: DifficultyLevel,
    /// Words already used this session.
    pub excluded: HashSet<String>,
    pub total_attempts: u32,
    pub total_correct: u32,
}

impl SessionState {
    fn new(difficulty: DifficultyLevel) -> Self {
        Self {
            difficulty,
            excluded: HashSet::new(),
            total_attempts: 0,
            total_correct: 0,
        }
    }
}

/// Everything the caller learns from one submission.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    /// Token-level scoring detail; `None` for skipped exercises.
    pub attempt: Option<AttemptResult>,
    pub is_correct: bool,
    pub mastery: WordMasteryRecord,
    /// Exercise status after the ladder update, for review exercises.
    pub exercise_status: Option<ExerciseStatus>,
    /// The next target, or `None` when the session has ended.
    pub next: Option<SelectionResult>,
}

/// Orchestrates one learner's practice session.
pub struct SessionCoordinator<W, E, P, S> {
    words: W,
    exercises: E,
    pool: P,
    sessions: S,
    user_id: Uuid,
    language: Language,
    config: SessionConfig,
    selector: WordSelector,
    rng: StdRng,
    phase: SessionPhase,
    state: SessionState,
    target: Option<String>,
    /// Latest in-session mastery values whose writes have not landed.
    overlay: HashMap<MasteryKey, WordMasteryRecord>,
    pending_writes: Vec<WordMasteryRecord>,
}

impl<W, E, P, S> SessionCoordinator<W, E, P, S>
where
    W: WordRepository,
    E: ExerciseRepository,
    P: WordPoolProvider,
    S: SessionRepository,
{
    pub fn new(
        words: W,
        exercises: E,
        pool: P,
        sessions: S,
        user_id: Uuid,
        language: Language,
        config: SessionConfig,
    ) -> Self {
        Self {
            words,
            exercises,
            pool,
            sessions,
            user_id,
            language,
            selector: WordSelector::new(config.selector),
            config,
            rng: StdRng::from_entropy(),
            phase: SessionPhase::Idle,
            state: SessionState::new(DifficultyLevel::default()),
            target: None,
            overlay: HashMap::new(),
            pending_writes: Vec::new(),
        }
    }

    /// Fix the selection RNG, for deterministic tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Mastery writes that could not be persisted this session.
    pub fn pending_writes(&self) -> &[WordMasteryRecord] {
        &self.pending_writes
    }

    /// Begin a session: reset transient state and pick the first target.
    pub async fn start_session(&mut self, difficulty: DifficultyLevel) -> Result<SelectionResult> {
        self.state = SessionState::new(difficulty);
        self.overlay.clear();
        self.pending_writes.clear();

        let selection = self.select_target().await?;
        self.target = Some(selection.word.clone());
        self.phase = SessionPhase::AwaitingAnswer;
        Ok(selection)
    }

    /// Score a submission, update mastery (and the review ladder for
    /// bidirectional exercises), and pick the next target.
    pub async fn submit_answer(
        &mut self,
        presented: &PresentedExercise,
        answer: &str,
        skipped: bool,
    ) -> Result<AttemptOutcome> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return Err(SessionError::NotAwaitingAnswer);
        }
        let target = self.target.clone().ok_or(SessionError::NotAwaitingAnswer)?;
        let now = Utc::now();

        self.phase = SessionPhase::Scoring;
        let (attempt, is_correct) = if skipped {
            (None, false)
        } else {
            match self.judge(presented, &target, answer) {
                Ok(judged) => judged,
                Err(error) => {
                    // Nothing was recorded; the target stays live so the
                    // caller can submit again.
                    self.phase = SessionPhase::AwaitingAnswer;
                    return Err(error);
                }
            }
        };

        self.phase = SessionPhase::Updating;
        let key = MasteryKey {
            user_id: self.user_id,
            word: target.clone(),
            language: self.language,
        };
        let mastery = self.apply_mastery(&key, is_correct, now).await;

        let exercise_status = match presented.review {
            Some((exercise_id, direction)) => {
                self.advance_exercise(exercise_id, direction, is_correct, now)
                    .await
            }
            None => None,
        };

        self.state.excluded.insert(target);
        self.state.total_attempts += 1;
        self.state.total_correct += u32::from(is_correct);

        let next = if self.state.total_attempts >= self.config.max_exercises {
            self.target = None;
            self.phase = SessionPhase::Ended;
            None
        } else {
            // The attempt above already landed, so a starved selector ends
            // the session early instead of discarding the outcome.
            match self.select_target().await {
                Ok(selection) => {
                    self.target = Some(selection.word.clone());
                    self.phase = SessionPhase::AwaitingAnswer;
                    Some(selection)
                }
                Err(error) => {
                    warn!(%error, "no next target available, ending session early");
                    self.target = None;
                    self.phase = SessionPhase::Ended;
                    None
                }
            }
        };

        Ok(AttemptOutcome {
            attempt,
            is_correct,
            mastery,
            exercise_status,
            next,
        })
    }

    /// Persist the session aggregate and clear transient state. Queued
    /// mastery writes get one more flush attempt here.
    pub async fn end_session(&mut self) -> Result<SessionSummary> {
        let summary = SessionSummary {
            total_attempts: self.state.total_attempts,
            total_correct: self.state.total_correct,
            ended_at: Utc::now(),
        };

        self.flush_pending_writes().await;

        if let Err(first) = self.sessions.save_summary(self.user_id, &summary).await {
            warn!(error = %first, "session summary save failed, retrying");
            if let Err(second) = self.sessions.save_summary(self.user_id, &summary).await {
                // The aggregate is the only thing lost; the per-attempt
                // mastery writes already happened.
                warn!(error = %second, "session summary lost");
            }
        }

        self.state.excluded.clear();
        self.target = None;
        self.phase = SessionPhase::Ended;
        Ok(summary)
    }

    fn judge(
        &self,
        presented: &PresentedExercise,
        target: &str,
        answer: &str,
    ) -> Result<(Option<AttemptResult>, bool)> {
        match presented.kind {
            ExerciseKind::ClozeWord => {
                let attempt = score(target, answer)?;
                let is_correct = answer.trim().to_lowercase() == target.to_lowercase();
                Ok((Some(attempt), is_correct))
            }
            ExerciseKind::Dictation => {
                let attempt = score(&presented.reference_text, answer)?;
                let is_correct = attempt.accuracy >= self.config.dictation_threshold;
                Ok((Some(attempt), is_correct))
            }
        }
    }

    /// Build the mastery snapshot and pool, then run the selector.
    async fn select_target(&mut self) -> Result<SelectionResult> {
        let now = Utc::now();
        let due = due_words_with_retry(&self.words, self.user_id, self.language, now).await;

        // In-session overlay supersedes stored records of the same key.
        let mut snapshot: HashMap<String, WordMasteryRecord> =
            due.into_iter().map(|r| (r.word.clone(), r)).collect();
        for record in self.overlay.values() {
            snapshot.insert(record.word.clone(), record.clone());
        }
        let snapshot: Vec<WordMasteryRecord> = snapshot.into_values().collect();

        let pool = pool_with_retry(&self.pool, self.language, self.state.difficulty).await;

        let selection = self.selector.select_next(
            &pool,
            &snapshot,
            &self.state.excluded,
            self.state.difficulty,
            self.language,
            now,
            &mut self.rng,
        )?;

        if selection.reused_excluded {
            warn!(word = %selection.word, "all fallback words excluded, reusing full list");
        }
        debug!(word = %selection.word, reason = ?selection.reason, quality = selection.quality, "target selected");
        Ok(selection)
    }

    /// Read-modify-write of one mastery record. Never fails the session:
    /// after a retry the computed value is kept in the overlay and queued.
    async fn apply_mastery(
        &mut self,
        key: &MasteryKey,
        is_correct: bool,
        now: DateTime<Utc>,
    ) -> WordMasteryRecord {
        let existing = self.latest_mastery(key).await;
        let updated = update_mastery(existing.as_ref(), key, is_correct, now);

        match self.words.upsert_mastery(&updated).await {
            Ok(()) => {
                self.overlay.remove(key);
                updated
            }
            Err(first) => {
                warn!(word = %key.word, error = %first, "mastery upsert failed, refreshing and retrying");
                let fresh = match self.words.get_mastery(key).await {
                    Ok(record) => record,
                    Err(_) => existing,
                };
                let reapplied = update_mastery(fresh.as_ref(), key, is_correct, now);
                match self.words.upsert_mastery(&reapplied).await {
                    Ok(()) => {
                        self.overlay.remove(key);
                        reapplied
                    }
                    Err(second) => {
                        warn!(word = %key.word, error = %second, "mastery upsert failed twice, queueing write");
                        self.overlay.insert(key.clone(), reapplied.clone());
                        self.pending_writes.push(reapplied.clone());
                        reapplied
                    }
                }
            }
        }
    }

    async fn latest_mastery(&self, key: &MasteryKey) -> Option<WordMasteryRecord> {
        if let Some(record) = self.overlay.get(key) {
            return Some(record.clone());
        }
        match self.words.get_mastery(key).await {
            Ok(record) => record,
            Err(first) => {
                warn!(word = %key.word, error = %first, "mastery read failed, retrying");
                self.words.get_mastery(key).await.ok().flatten()
            }
        }
    }

    /// Advance one direction of a review exercise and re-check mastery.
    /// Storage trouble here degrades to a warning; the session carries on.
    async fn advance_exercise(
        &mut self,
        exercise_id: Uuid,
        direction: Direction,
        is_correct: bool,
        now: DateTime<Utc>,
    ) -> Option<ExerciseStatus> {
        let history =
            match events_with_retry(&self.exercises, exercise_id, direction).await {
                Ok(events) => events,
                Err(error) => {
                    warn!(%exercise_id, ?direction, %error, "review history unavailable, skipping ladder update");
                    return None;
                }
            };

        let ctx = ReviewContext {
            exercise_id,
            direction,
        };
        let (due, event) = advance_review(&history, ctx, is_correct, now);

        if let Err(first) = self.exercises.append_review_event(&event).await {
            warn!(%exercise_id, error = %first, "review event append failed, retrying");
            if let Err(second) = self.exercises.append_review_event(&event).await {
                warn!(%exercise_id, error = %second, "review event lost, skipping ladder update");
                return None;
            }
        }
        debug!(%exercise_id, ?direction, round = event.round, is_correct, ?due, "review advanced");

        self.promote_if_mastered(exercise_id).await
    }

    /// Re-evaluate exercise status from the full event log. Promotion is
    /// monotone: a stored `Mastered` is never downgraded.
    async fn promote_if_mastered(&self, exercise_id: Uuid) -> Option<ExerciseStatus> {
        let forward = events_with_retry(&self.exercises, exercise_id, Direction::Forward)
            .await
            .ok()?;
        let backward = events_with_retry(&self.exercises, exercise_id, Direction::Backward)
            .await
            .ok()?;

        let current = self
            .exercises
            .get_exercise_status(exercise_id)
            .await
            .unwrap_or_default();
        if current == ExerciseStatus::Mastered {
            return Some(current);
        }

        if check_mastered(&forward, &backward) {
            if let Err(error) = self
                .exercises
                .set_exercise_status(exercise_id, ExerciseStatus::Mastered)
                .await
            {
                warn!(%exercise_id, %error, "mastered promotion write failed");
                return Some(current);
            }
            debug!(%exercise_id, "exercise mastered");
            return Some(ExerciseStatus::Mastered);
        }
        Some(current)
    }

    /// One flush attempt for writes queued during the session. A conflict
    /// here means another writer advanced the record while storage was
    /// down; the queued value is stale by definition, so it is dropped and
    /// reported.
    async fn flush_pending_writes(&mut self) {
        let queued = std::mem::take(&mut self.pending_writes);
        for record in queued {
            match self.words.upsert_mastery(&record).await {
                Ok(()) => {
                    self.overlay.remove(&record.key());
                }
                Err(RepositoryError::Conflict) => {
                    warn!(word = %record.word, "queued mastery write superseded, dropping");
                }
                Err(error) => {
                    warn!(word = %record.word, %error, "queued mastery write still failing, dropping");
                }
            }
        }
    }
}

async fn due_words_with_retry<W: WordRepository>(
    repo: &W,
    user_id: Uuid,
    language: Language,
    now: DateTime<Utc>,
) -> Vec<WordMasteryRecord> {
    let today = now.date_naive();
    match repo.get_due_words(user_id, language, today).await {
        Ok(records) => records,
        Err(first) => {
            warn!(error = %first, "due-word query failed, retrying");
            match repo.get_due_words(user_id, language, today).await {
                Ok(records) => records,
                Err(second) => {
                    warn!(error = %second, "due-word query failed twice, continuing without review tier");
                    Vec::new()
                }
            }
        }
    }
}

async fn pool_with_retry<P: WordPoolProvider>(
    provider: &P,
    language: Language,
    difficulty: DifficultyLevel,
) -> Vec<progress_core::PoolWord> {
    match provider.ranked_pool(language, difficulty).await {
        Ok(pool) => pool,
        Err(first) => {
            warn!(error = %first, "word pool fetch failed, retrying");
            match provider.ranked_pool(language, difficulty).await {
                Ok(pool) => pool,
                Err(second) => {
                    warn!(error = %second, "word pool fetch failed twice, falling back to built-in words");
                    Vec::new()
                }
            }
        }
    }
}

async fn events_with_retry<E: ExerciseRepository>(
    repo: &E,
    exercise_id: Uuid,
    direction: Direction,
) -> std::result::Result<Vec<ReviewEvent>, RepositoryError> {
    match repo.get_review_events(exercise_id, direction).await {
        Ok(events) => Ok(events),
        Err(first) => {
            warn!(error = %first, "review event query failed, retrying");
            repo.get_review_events(exercise_id, direction).await
        }
    }
}
