//! Next-word selection.
//!
//! Three tiers, first non-empty wins: words due for review (weakest and
//! longest-unseen first), then a shuffled draw from the frequency-ranked
//! pool with a per-word-type diversity cap, then a small built-in fallback
//! list per language and difficulty.

use crate::error::SelectError;
use crate::types::{
    DifficultyLevel, Language, PoolWord, SelectionReason, SelectionResult, WordMasteryRecord,
    WordType,
};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

const REVIEW_QUALITY: f64 = 90.0;
const FALLBACK_QUALITY: f64 = 60.0;
const WORD_TYPE_COUNT: usize = 4;

/// Tuning knobs for selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    /// Diversity cap: max words of one lexical category in the first
    /// selection pass.
    pub max_repetitions_per_type: u32,
    /// Candidates gathered per selection (one target plus alternatives).
    pub batch_size: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_repetitions_per_type: 2,
            batch_size: 8,
        }
    }
}

/// Picks the next target word from mastery state and a ranked pool.
#[derive(Debug, Clone, Default)]
pub struct WordSelector {
    config: SelectorConfig,
}

impl WordSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Select the next target word.
    ///
    /// Never returns a word in `excluded`, except the fallback's last-resort
    /// full-list reuse, flagged via `reused_excluded`.
    pub fn select_next<R: Rng>(
        &self,
        pool: &[PoolWord],
        mastery: &[WordMasteryRecord],
        excluded: &HashSet<String>,
        difficulty: DifficultyLevel,
        language: Language,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<SelectionResult, SelectError> {
        if let Some(result) = self.pick_due(mastery, excluded, now) {
            return Ok(result);
        }
        if let Some(result) = self.pick_from_pool(pool, excluded, difficulty, rng) {
            return Ok(result);
        }
        self.pick_fallback(language, difficulty, excluded, rng)
    }

    /// Tier 1: words whose next review date has arrived, weakest and
    /// longest-unseen first.
    fn pick_due(
        &self,
        mastery: &[WordMasteryRecord],
        excluded: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Option<SelectionResult> {
        let today = now.date_naive();
        let mut due: Vec<&WordMasteryRecord> = mastery
            .iter()
            .filter(|r| r.is_due(today) && !excluded.contains(&r.word))
            .collect();
        due.sort_by(|a, b| {
            (a.mastery_level, a.last_reviewed_at).cmp(&(b.mastery_level, b.last_reviewed_at))
        });

        let mut words = due.iter().map(|r| r.word.clone());
        let word = words.next()?;
        Some(SelectionResult {
            word,
            reason: SelectionReason::Review,
            alternatives: words.take(self.config.batch_size.saturating_sub(1)).collect(),
            quality: REVIEW_QUALITY,
            reused_excluded: false,
        })
    }

    /// Tier 2: shuffled frequency-pool draw with a diversity cap, then an
    /// unconstrained pass to fill the batch.
    fn pick_from_pool<R: Rng>(
        &self,
        pool: &[PoolWord],
        excluded: &HashSet<String>,
        difficulty: DifficultyLevel,
        rng: &mut R,
    ) -> Option<SelectionResult> {
        let mut candidates: Vec<&PoolWord> = pool
            .iter()
            .filter(|w| difficulty.admits(w.difficulty) && !excluded.contains(&w.word))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates.shuffle(rng);

        let mut selected: Vec<&PoolWord> = Vec::with_capacity(self.config.batch_size);
        let mut per_type: HashMap<WordType, u32> = HashMap::new();

        // Diversity pass: honor the per-type cap.
        for &word in &candidates {
            if selected.len() >= self.config.batch_size {
                break;
            }
            let count = per_type.entry(word.word_type).or_insert(0);
            if *count < self.config.max_repetitions_per_type {
                *count += 1;
                selected.push(word);
            }
        }

        // Fill pass: top up the batch ignoring the cap.
        if selected.len() < self.config.batch_size {
            for &word in &candidates {
                if selected.len() >= self.config.batch_size {
                    break;
                }
                if !selected.iter().any(|s| s.word == word.word) {
                    selected.push(word);
                }
            }
        }

        let quality = self.pool_quality(&selected, &candidates);
        let mut words = selected.iter().map(|w| w.word.clone());
        let word = words.next()?;
        Some(SelectionResult {
            word,
            reason: SelectionReason::FrequencyBased,
            alternatives: words.collect(),
            quality,
            reused_excluded: false,
        })
    }

    /// Quality of a pool selection: half lexical variety, half how close the
    /// picked words sit to the top of the frequency ranking.
    fn pool_quality(&self, selected: &[&PoolWord], candidates: &[&PoolWord]) -> f64 {
        if selected.is_empty() {
            return 0.0;
        }
        let distinct_types = selected
            .iter()
            .map(|w| w.word_type)
            .collect::<HashSet<_>>()
            .len();
        let variety = distinct_types as f64 / WORD_TYPE_COUNT as f64;

        let max_rank = candidates
            .iter()
            .map(|w| w.frequency_rank)
            .max()
            .unwrap_or(1)
            .max(1) as f64;
        let mean_rank = selected.iter().map(|w| w.frequency_rank as f64).sum::<f64>()
            / selected.len() as f64;
        let rank_component = (1.0 - mean_rank / max_rank).clamp(0.0, 1.0);

        (100.0 * (0.5 * variety + 0.5 * rank_component)).clamp(0.0, 100.0)
    }

    /// Tier 3: built-in word list. If exclusions empty it, reuse the full
    /// list rather than starve the session.
    fn pick_fallback<R: Rng>(
        &self,
        language: Language,
        difficulty: DifficultyLevel,
        excluded: &HashSet<String>,
        rng: &mut R,
    ) -> Result<SelectionResult, SelectError> {
        let full = fallback_words(language, difficulty);
        let mut available: Vec<&str> = full
            .iter()
            .copied()
            .filter(|w| !excluded.contains(*w))
            .collect();

        let reused_excluded = available.is_empty();
        if reused_excluded {
            available = full.to_vec();
        }
        if available.is_empty() {
            return Err(SelectError::NoCandidateWords);
        }
        available.shuffle(rng);

        let mut words = available
            .iter()
            .take(self.config.batch_size)
            .map(|w| w.to_string());
        let word = words.next().ok_or(SelectError::NoCandidateWords)?;
        Ok(SelectionResult {
            word,
            reason: SelectionReason::Fallback,
            alternatives: words.collect(),
            quality: FALLBACK_QUALITY,
            reused_excluded,
        })
    }
}

/// Built-in last-resort word lists.
fn fallback_words(language: Language, difficulty: DifficultyLevel) -> &'static [&'static str] {
    use DifficultyLevel::*;
    use Language::*;
    match (language, difficulty) {
        (English, Beginner) => &["house", "water", "friend", "morning", "book"],
        (English, Intermediate) => &["journey", "weather", "improve", "although", "brief"],
        (English, Advanced) => &["nevertheless", "endeavor", "ambiguous", "thorough", "subtle"],
        (Spanish, Beginner) => &["casa", "agua", "amigo", "mañana", "libro"],
        (Spanish, Intermediate) => &["viaje", "tiempo", "mejorar", "aunque", "breve"],
        (Spanish, Advanced) => &["desarrollo", "esfuerzo", "ambiguo", "minucioso", "sutil"],
        (French, Beginner) => &["maison", "eau", "ami", "matin", "livre"],
        (French, Intermediate) => &["voyage", "temps", "améliorer", "quoique", "bref"],
        (French, Advanced) => &["néanmoins", "effort", "ambigu", "minutieux", "subtil"],
        (German, Beginner) => &["Haus", "Wasser", "Freund", "Morgen", "Buch"],
        (German, Intermediate) => &["Reise", "Wetter", "verbessern", "obwohl", "kurz"],
        (German, Advanced) => &["dennoch", "Bestreben", "mehrdeutig", "gründlich", "subtil"],
    }
}
