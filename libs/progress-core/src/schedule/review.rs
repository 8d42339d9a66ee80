//! Fixed-interval bidirectional review ladder.
//!
//! Each exercise is reviewed in two directions (forward and backward); each
//! direction walks a fixed interval table keyed by the 1-based attempt round.
//! Rounds count attempts and never reset; a failed attempt only shortens the
//! assigned interval to the 30-second retry. An exercise is mastered once
//! both directions hold a correct attempt at round 6 or later.

use super::IntervalLadder;
use crate::types::{Direction, DueDate, ReviewEvent};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Round at which a correct attempt qualifies a direction for mastery.
pub const MASTERY_ROUND: u32 = 6;

/// Retry delay after any incorrect attempt.
const RETRY_INTERVAL_SECS: i64 = 30;

/// The fixed interval table, indexed by attempt round.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewLadder;

impl IntervalLadder for ReviewLadder {
    fn name(&self) -> &'static str {
        "review"
    }

    fn interval_after(&self, rung: u32, is_correct: bool) -> Duration {
        if !is_correct {
            return Duration::seconds(RETRY_INTERVAL_SECS);
        }
        match rung {
            0 | 1 => Duration::seconds(RETRY_INTERVAL_SECS),
            2 => Duration::days(1),
            3 => Duration::days(3),
            4 => Duration::days(7),
            5 => Duration::days(14),
            6 => Duration::days(30),
            _ => Duration::days(365),
        }
    }
}

/// Identifies the direction of one exercise under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewContext {
    pub exercise_id: Uuid,
    pub direction: Direction,
}

/// Advance one direction of an exercise by one attempt.
///
/// The round is derived from the event history (prior attempts + 1), so a
/// replayed history always reproduces the same ladder position. Returns the
/// assigned due point and the event to append.
pub fn advance_review(
    history: &[ReviewEvent],
    ctx: ReviewContext,
    is_correct: bool,
    now: DateTime<Utc>,
) -> (DueDate, ReviewEvent) {
    let round = history.len() as u32 + 1;
    let interval = ReviewLadder.interval_after(round, is_correct);
    let due = due_after(now, interval);
    let event = ReviewEvent {
        exercise_id: ctx.exercise_id,
        direction: ctx.direction,
        round,
        is_correct,
        due_assigned: due,
        completed_at: now,
    };
    (due, event)
}

/// Sub-day intervals keep timestamp precision; day-scale intervals collapse
/// to a calendar date.
fn due_after(now: DateTime<Utc>, interval: Duration) -> DueDate {
    if interval < Duration::days(1) {
        DueDate::At(now + interval)
    } else {
        DueDate::On((now + interval).date_naive())
    }
}

/// Whether this direction is due for review. A direction with no history is
/// always due.
pub fn is_due(history: &[ReviewEvent], now: DateTime<Utc>) -> bool {
    match history.last() {
        None => true,
        Some(event) => event.due_assigned.is_due(now),
    }
}

/// Whether the exercise qualifies as mastered: each direction holds at least
/// one correct attempt at the mastery round or later. Scans full history, so
/// a failure after a qualifying success does not retract mastery.
pub fn check_mastered(forward: &[ReviewEvent], backward: &[ReviewEvent]) -> bool {
    direction_qualifies(forward) && direction_qualifies(backward)
}

fn direction_qualifies(events: &[ReviewEvent]) -> bool {
    events
        .iter()
        .any(|e| e.is_correct && e.round >= MASTERY_ROUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    fn ctx() -> ReviewContext {
        ReviewContext {
            exercise_id: Uuid::nil(),
            direction: Direction::Forward,
        }
    }

    fn run_rounds(count: usize, correct: bool) -> Vec<ReviewEvent> {
        let mut history = Vec::new();
        for _ in 0..count {
            let (_, event) = advance_review(&history, ctx(), correct, now());
            history.push(event);
        }
        history
    }

    #[test]
    fn first_round_is_thirty_seconds() {
        let (due, event) = advance_review(&[], ctx(), true, now());
        assert_eq!(event.round, 1);
        assert_eq!(due, DueDate::At(now() + Duration::seconds(30)));
    }

    #[test]
    fn interval_table_walks_up() {
        let ladder = ReviewLadder;
        assert_eq!(ladder.interval_after(2, true), Duration::days(1));
        assert_eq!(ladder.interval_after(3, true), Duration::days(3));
        assert_eq!(ladder.interval_after(4, true), Duration::days(7));
        assert_eq!(ladder.interval_after(5, true), Duration::days(14));
        assert_eq!(ladder.interval_after(6, true), Duration::days(30));
        assert_eq!(ladder.interval_after(7, true), Duration::days(365));
        assert_eq!(ladder.interval_after(40, true), Duration::days(365));
    }

    #[test]
    fn incorrect_attempt_always_thirty_seconds() {
        for prior in [0, 1, 3, 5, 9] {
            let history = run_rounds(prior, true);
            let (due, event) = advance_review(&history, ctx(), false, now());
            assert_eq!(event.round, prior as u32 + 1);
            assert_eq!(due, DueDate::At(now() + Duration::seconds(30)));
        }
    }

    #[test]
    fn rounds_are_monotone_through_failures() {
        let mut history = run_rounds(3, true);
        let (_, failed) = advance_review(&history, ctx(), false, now());
        assert_eq!(failed.round, 4);
        history.push(failed);
        let (_, next) = advance_review(&history, ctx(), true, now());
        assert_eq!(next.round, 5);
    }

    #[test]
    fn day_scale_intervals_use_calendar_dates() {
        let history = run_rounds(1, true);
        let (due, _) = advance_review(&history, ctx(), true, now());
        assert_eq!(due, DueDate::On((now() + Duration::days(1)).date_naive()));
    }

    #[test]
    fn fresh_direction_is_due() {
        assert!(is_due(&[], now()));
    }

    #[test]
    fn direction_not_due_before_assigned_interval() {
        let history = run_rounds(2, true);
        assert!(!is_due(&history, now()));
        assert!(is_due(&history, now() + Duration::days(2)));
    }

    #[test]
    fn mastery_requires_both_directions() {
        let forward = run_rounds(6, true);
        assert!(!check_mastered(&forward, &[]));
        let backward = run_rounds(6, true);
        assert!(check_mastered(&forward, &backward));
    }

    #[test]
    fn five_rounds_do_not_qualify() {
        let forward = run_rounds(5, true);
        let backward = run_rounds(6, true);
        assert!(!check_mastered(&forward, &backward));
    }

    #[test]
    fn failure_after_qualifying_success_keeps_mastery() {
        let mut forward = run_rounds(6, true);
        let (_, failed) = advance_review(&forward, ctx(), false, now());
        forward.push(failed);
        let backward = run_rounds(6, true);
        assert!(check_mastered(&forward, &backward));
    }

    #[test]
    fn failed_sixth_round_does_not_qualify() {
        let mut history = run_rounds(5, true);
        let (_, failed) = advance_review(&history, ctx(), false, now());
        history.push(failed);
        let backward = run_rounds(6, true);
        assert!(!check_mastered(&history, &backward));
    }
}
