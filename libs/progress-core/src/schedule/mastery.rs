//! Per-word mastery tracking.
//!
//! Each (user, word, language) carries a mastery level 1-10, lifetime
//! attempt counts, and a next review date. The interval grows with the
//! mastery level; the level moves with lifetime accuracy.

use super::IntervalLadder;
use crate::types::{MasteryKey, WordMasteryRecord};
use chrono::{DateTime, Duration, Utc};

const LEVEL_MIN: u8 = 1;
const LEVEL_MAX: u8 = 10;
const MULTIPLIER_STEP: f64 = 1.5;
const MULTIPLIER_CAP: f64 = 7.0;
const PROMOTE_ACCURACY: f64 = 0.8;
const DEMOTE_ACCURACY: f64 = 0.6;

/// Mastery-level interval ladder: base interval 2d (pass) / 1d (fail),
/// scaled by the level.
#[derive(Debug, Clone, Copy, Default)]
pub struct MasteryLadder;

impl IntervalLadder for MasteryLadder {
    fn name(&self) -> &'static str {
        "mastery"
    }

    fn interval_after(&self, rung: u32, is_correct: bool) -> Duration {
        let base = if is_correct { 2.0 } else { 1.0 };
        let multiplier = (rung as f64 * MULTIPLIER_STEP).min(MULTIPLIER_CAP);
        Duration::days((base * multiplier).ceil() as i64)
    }
}

/// Compute the updated mastery record after one attempt.
///
/// Pure read-modify-write step: callers must pass the latest stored record
/// (or `None` on first encounter) and persist the result atomically by key.
pub fn update_mastery(
    existing: Option<&WordMasteryRecord>,
    key: &MasteryKey,
    is_correct: bool,
    now: DateTime<Utc>,
) -> WordMasteryRecord {
    match existing {
        None => first_encounter(key, is_correct, now),
        Some(record) => {
            let review_count = record.review_count + 1;
            let correct_count = record.correct_count + u32::from(is_correct);
            let accuracy = correct_count as f64 / review_count as f64;

            // Interval uses the level before any promotion/demotion.
            let interval = MasteryLadder.interval_after(record.mastery_level as u32, is_correct);

            let mastery_level = if is_correct && accuracy >= PROMOTE_ACCURACY {
                (record.mastery_level + 1).min(LEVEL_MAX)
            } else if !is_correct && accuracy < DEMOTE_ACCURACY {
                (record.mastery_level - 1).max(LEVEL_MIN)
            } else {
                record.mastery_level
            };

            WordMasteryRecord {
                user_id: record.user_id,
                word: record.word.clone(),
                language: record.language,
                mastery_level,
                review_count,
                correct_count,
                last_reviewed_at: now,
                next_review_date: (now + interval).date_naive(),
                version: record.version,
            }
        }
    }
}

fn first_encounter(key: &MasteryKey, is_correct: bool, now: DateTime<Utc>) -> WordMasteryRecord {
    let days = if is_correct { 2 } else { 1 };
    WordMasteryRecord {
        user_id: key.user_id,
        word: key.word.clone(),
        language: key.language,
        mastery_level: LEVEL_MIN,
        review_count: 1,
        correct_count: u32::from(is_correct),
        last_reviewed_at: now,
        next_review_date: (now + Duration::days(days)).date_naive(),
        version: 0,
    }
}
