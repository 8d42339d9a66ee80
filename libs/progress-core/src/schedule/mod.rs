//! Spaced-repetition interval ladders.
//!
//! Two ladders share one abstraction: per-word mastery tracking
//! ([`mastery`]) and the fixed-interval bidirectional exercise ladder
//! ([`review`]). Both are pure; persistence belongs to the caller.

pub mod mastery;
pub mod review;

use chrono::Duration;

/// A spaced-repetition interval ladder: maps a rung index and a pass/fail
/// signal to the delay before the next review.
pub trait IntervalLadder: Send + Sync {
    /// Ladder identifier.
    fn name(&self) -> &'static str;

    /// Delay to the next review after an attempt at `rung`.
    fn interval_after(&self, rung: u32, is_correct: bool) -> Duration;
}

/// Get a ladder by name.
pub fn get_ladder(name: &str) -> Option<Box<dyn IntervalLadder>> {
    match name {
        "mastery" => Some(Box::new(mastery::MasteryLadder)),
        "review" => Some(Box::new(review::ReviewLadder)),
        _ => None,
    }
}
