//! Core types for the learning-progress engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported study languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Spanish,
    French,
    German,
}

impl Language {
    /// Get the language code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::German => "de",
        }
    }

    /// Parse from a language code.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "en" => Some(Self::English),
            "es" => Some(Self::Spanish),
            "fr" => Some(Self::French),
            "de" => Some(Self::German),
            _ => None,
        }
    }
}

/// Difficulty tier for word pools. Tiers are cumulative: a learner at
/// `Advanced` draws from all three tiers, at `Intermediate` from two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    fn tier(self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
        }
    }

    /// Whether a word tagged `word_tier` is available at this difficulty.
    pub fn admits(self, word_tier: DifficultyLevel) -> bool {
        word_tier.tier() <= self.tier()
    }
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        Self::Beginner
    }
}

/// Lexical category of a pool word, used for diversity caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordType {
    Noun,
    Verb,
    Adjective,
    Other,
}

/// Classification of one aligned token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Tokens match (case-insensitive).
    Correct,
    /// Minor typo: character edit distance within the typo bound.
    Almost,
    /// Aligned but beyond the typo bound.
    Incorrect,
    /// Reference token with no aligned answer token.
    Missing,
    /// Answer token with no aligned reference token.
    Extra,
}

/// One aligned token pair with its verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenVerdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub status: TokenStatus,
}

/// Per-status verdict counts for one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub correct: u32,
    pub almost: u32,
    pub incorrect: u32,
    pub missing: u32,
    pub extra: u32,
}

impl VerdictCounts {
    pub fn record(&mut self, status: TokenStatus) {
        match status {
            TokenStatus::Correct => self.correct += 1,
            TokenStatus::Almost => self.almost += 1,
            TokenStatus::Incorrect => self.incorrect += 1,
            TokenStatus::Missing => self.missing += 1,
            TokenStatus::Extra => self.extra += 1,
        }
    }
}

/// Result of scoring one submission against a reference text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub verdicts: Vec<TokenVerdict>,
    /// Accuracy percentage in [0, 100].
    pub accuracy: f64,
    pub counts: VerdictCounts,
}

/// Composite key for a word mastery record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasteryKey {
    pub user_id: Uuid,
    pub word: String,
    pub language: Language,
}

/// Lifetime repetition history for one (user, word, language).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordMasteryRecord {
    pub user_id: Uuid,
    pub word: String,
    pub language: Language,
    /// Retention strength, 1..=10.
    pub mastery_level: u8,
    pub review_count: u32,
    pub correct_count: u32,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_date: NaiveDate,
    /// Optimistic-concurrency token; bumped by the repository on upsert.
    pub version: u64,
}

impl WordMasteryRecord {
    pub fn key(&self) -> MasteryKey {
        MasteryKey {
            user_id: self.user_id,
            word: self.word.clone(),
            language: self.language,
        }
    }

    /// Whether this word is due for review at `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }
}

/// Review direction of a bidirectional exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// Lifecycle status of a bidirectional exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStatus {
    Learning,
    Reviewing,
    Mastered,
}

impl Default for ExerciseStatus {
    fn default() -> Self {
        Self::Learning
    }
}

/// A scheduled due point. Sub-day deltas keep full timestamp precision
/// (the 30-second retry rung needs it); longer deltas are calendar dates,
/// so a review due "today" is due at any time today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDate {
    At(DateTime<Utc>),
    On(NaiveDate),
}

impl DueDate {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::At(t) => *t <= now,
            Self::On(d) => *d <= now.date_naive(),
        }
    }
}

/// Append-only log entry for one review attempt on one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub exercise_id: Uuid,
    pub direction: Direction,
    /// 1-based attempt index within this direction; monotone, never reset.
    pub round: u32,
    pub is_correct: bool,
    pub due_assigned: DueDate,
    pub completed_at: DateTime<Utc>,
}

/// One entry of a frequency-ranked word pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolWord {
    pub word: String,
    pub word_type: WordType,
    pub difficulty: DifficultyLevel,
    /// 1 = most frequent.
    pub frequency_rank: u32,
}

/// Which selection tier produced a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    Review,
    FrequencyBased,
    Fallback,
}

/// Outcome of a next-word selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub word: String,
    pub reason: SelectionReason,
    /// Remaining candidates from the same batch, in selection order.
    pub alternatives: Vec<String>,
    /// Selection confidence in [0, 100]: review=90, frequency=computed,
    /// fallback=60.
    pub quality: f64,
    /// Set when the fallback had to reuse already-excluded words to avoid
    /// starvation. Callers should log this.
    pub reused_excluded: bool,
}
