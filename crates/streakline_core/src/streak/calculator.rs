//! Calendar-day streak calculator.

use crate::model::completion::CompletionRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum whole days between `today` and the last qualifying completion for
/// the newest run to still count as the current streak.
///
/// Applied to weekly and monthly habits as well.
pub const ACTIVE_GRACE_DAYS: i64 = 1;

/// Streak summary derived from completions and the habit target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Length of the newest run, or 0 when that run is no longer active.
    pub current: u32,
    /// Longest run ever observed.
    pub longest: u32,
    /// Newest qualifying calendar day.
    pub last_completed: Option<NaiveDate>,
}

/// Recomputes the streak state from scratch.
///
/// `records` may arrive in any order. Only records with
/// `value >= target_value` take part.
///
/// # Preconditions
/// - `target_value` is finite and positive. Callers validate it; this
///   function only asserts it in debug builds.
/// - At most one record per calendar day. Duplicate days are collapsed.
pub fn recompute(records: &[CompletionRecord], target_value: f64, today: NaiveDate) -> StreakState {
    debug_assert!(
        target_value.is_finite() && target_value > 0.0,
        "target_value must be finite and positive, got {target_value}"
    );

    let mut days: Vec<NaiveDate> = records
        .iter()
        .filter(|record| record.qualifies(target_value))
        .map(|record| record.date)
        .collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&last_completed) = days.first() else {
        return StreakState::default();
    };

    let mut longest = 0u32;
    let mut run = 1u32;
    let mut newest_run: Option<u32> = None;

    for pair in days.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            run += 1;
            continue;
        }
        newest_run.get_or_insert(run);
        longest = longest.max(run);
        run = 1;
    }
    longest = longest.max(run);
    let newest_run = newest_run.unwrap_or(run);

    let current = if (today - last_completed).num_days() <= ACTIVE_GRACE_DAYS {
        newest_run
    } else {
        0
    };

    StreakState {
        current,
        longest,
        last_completed: Some(last_completed),
    }
}

#[cfg(test)]
mod tests {
    use super::{recompute, StreakState};
    use crate::model::completion::CompletionRecord;
    use chrono::{Duration, NaiveDate};

    const TARGET: f64 = 1.0;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn days_ago(offsets: &[i64]) -> Vec<CompletionRecord> {
        offsets
            .iter()
            .map(|offset| CompletionRecord::new(today() - Duration::days(*offset), TARGET))
            .collect()
    }

    fn state(current: u32, longest: u32, last_offset: i64) -> StreakState {
        StreakState {
            current,
            longest,
            last_completed: Some(today() - Duration::days(last_offset)),
        }
    }

    #[test]
    fn empty_records_yield_zero_state() {
        assert_eq!(recompute(&[], TARGET, today()), StreakState::default());
        assert_eq!(recompute(&[], 42.5, today()), StreakState::default());
    }

    #[test]
    fn five_consecutive_days_ending_today() {
        let records = days_ago(&[4, 3, 2, 1, 0]);
        assert_eq!(recompute(&records, TARGET, today()), state(5, 5, 0));
    }

    #[test]
    fn gap_splits_runs_and_newest_run_is_current() {
        let records = days_ago(&[5, 4, 3, 1, 0]);
        assert_eq!(recompute(&records, TARGET, today()), state(2, 3, 0));
    }

    #[test]
    fn yesterday_keeps_streak_active() {
        let records = days_ago(&[4, 3, 2, 1]);
        assert_eq!(recompute(&records, TARGET, today()), state(4, 4, 1));
    }

    #[test]
    fn two_day_gap_resets_current_but_keeps_longest() {
        let records = days_ago(&[4, 3, 2]);
        assert_eq!(recompute(&records, TARGET, today()), state(0, 3, 2));
    }

    #[test]
    fn below_target_records_are_ignored() {
        let mut records = days_ago(&[1, 0]);
        records.push(CompletionRecord::new(today() - Duration::days(10), 0.5));
        records.push(CompletionRecord::new(today() - Duration::days(2), 0.99));

        assert_eq!(recompute(&records, TARGET, today()), state(2, 2, 0));
    }

    #[test]
    fn only_partial_records_yield_zero_state() {
        let records = vec![CompletionRecord::new(today(), 2.0)];
        assert_eq!(recompute(&records, 3.0, today()), StreakState::default());
    }

    #[test]
    fn single_record_active_and_expired() {
        assert_eq!(recompute(&days_ago(&[0]), TARGET, today()), state(1, 1, 0));
        assert_eq!(recompute(&days_ago(&[1]), TARGET, today()), state(1, 1, 1));
        assert_eq!(recompute(&days_ago(&[3]), TARGET, today()), state(0, 1, 3));
    }

    #[test]
    fn removing_middle_day_splits_run() {
        let full = days_ago(&[4, 3, 2, 1, 0]);
        assert_eq!(recompute(&full, TARGET, today()), state(5, 5, 0));

        let split: Vec<CompletionRecord> = full
            .into_iter()
            .filter(|record| record.date != today() - Duration::days(2))
            .collect();
        assert_eq!(recompute(&split, TARGET, today()), state(2, 2, 0));
    }

    #[test]
    fn newest_run_shorter_than_historical_longest() {
        let records = days_ago(&[20, 19, 18, 17, 16, 15, 1, 0]);
        assert_eq!(recompute(&records, TARGET, today()), state(2, 6, 0));
    }

    #[test]
    fn input_order_does_not_matter() {
        let ordered = days_ago(&[9, 8, 6, 5, 4, 2, 1]);
        let expected = recompute(&ordered, TARGET, today());

        let mut reversed = ordered.clone();
        reversed.reverse();
        assert_eq!(recompute(&reversed, TARGET, today()), expected);

        for shift in 1..ordered.len() {
            let mut rotated = ordered.clone();
            rotated.rotate_left(shift);
            assert_eq!(recompute(&rotated, TARGET, today()), expected);
        }

        let interleaved = days_ago(&[4, 9, 1, 6, 2, 8, 5]);
        assert_eq!(recompute(&interleaved, TARGET, today()), expected);
    }

    #[test]
    fn recompute_is_idempotent() {
        let records = days_ago(&[7, 6, 3, 2, 1]);
        let first = recompute(&records, TARGET, today());
        let second = recompute(&records, TARGET, today());
        assert_eq!(first, second);
    }

    #[test]
    fn longest_never_below_current() {
        let patterns: &[&[i64]] = &[
            &[0],
            &[1, 0],
            &[5, 3, 1, 0],
            &[2, 1],
            &[10, 9, 8, 1],
            &[30, 29, 28, 27, 0],
            &[6, 4, 2],
        ];

        for offsets in patterns {
            let result = recompute(&days_ago(offsets), TARGET, today());
            assert!(
                result.longest >= result.current,
                "pattern {offsets:?} produced {result:?}"
            );
        }
    }

    #[test]
    fn runs_cross_month_and_leap_day_boundaries() {
        let dates = [
            NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ];
        let records: Vec<CompletionRecord> = dates
            .iter()
            .map(|date| CompletionRecord::new(*date, TARGET))
            .collect();

        let result = recompute(&records, TARGET, dates[2]);
        assert_eq!(result.current, 3);
        assert_eq!(result.longest, 3);
    }

    #[test]
    fn duplicate_days_are_collapsed() {
        let mut records = days_ago(&[1, 0]);
        records.push(CompletionRecord::new(today(), 3.0));
        assert_eq!(recompute(&records, TARGET, today()), state(2, 2, 0));
    }

    #[test]
    fn future_dated_completion_counts_as_active() {
        let records = vec![CompletionRecord::new(today() + Duration::days(1), TARGET)];
        let result = recompute(&records, TARGET, today());
        assert_eq!(result.current, 1);
        assert_eq!(result.longest, 1);
    }
}
