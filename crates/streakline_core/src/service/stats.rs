//! Per-habit completion statistics.
//!
//! # Responsibility
//! - Resolve an optional date range into inclusive calendar bounds.
//! - Summarize completions of active habits inside that range.
//!
//! # Invariants
//! - Only `is_active` habits are reported.
//! - With an explicit bound, habits without completions in range are omitted.
//! - Without bounds every completion counts against a 30-day denominator.
//! - Streak columns are recomputed as of the caller's `today`, not read from
//!   the state stored at the last write.

use crate::model::habit::{Habit, HabitCategory, HabitFrequency, HabitId};
use crate::streak::recompute;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Window length used when a range bound is missing.
pub const DEFAULT_STATS_WINDOW_DAYS: i64 = 30;

/// Caller-supplied range; both ends inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Range after defaults were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    /// `None` means unbounded: every completion counts.
    pub bounds: Option<(NaiveDate, NaiveDate)>,
    /// Denominator for completion rate.
    pub days: i64,
}

impl ResolvedRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.bounds
            .is_none_or(|(start, end)| start <= date && date <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsRangeError {
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

impl Display for StatsRangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartAfterEnd { start, end } => {
                write!(f, "stats range start {start} is after end {end}")
            }
        }
    }
}

impl Error for StatsRangeError {}

/// Statistics row for one habit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStats {
    pub habit_id: HabitId,
    pub title: String,
    pub category: HabitCategory,
    pub frequency: HabitFrequency,
    pub target_value: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Sum of logged values in range, qualifying or not.
    pub total_value: f64,
    /// Completion days in range.
    pub completion_count: u32,
    /// `completion_count / days * 100`, rounded. May exceed 100 when unbounded.
    pub completion_rate: u32,
}

/// Applies range defaults relative to `today`.
///
/// A single bound is closed into a finite window so the completion rate has a
/// real denominator: start-only runs through `today`, end-only looks back
/// `DEFAULT_STATS_WINDOW_DAYS`. The missing side is never left open, so
/// completions after `today` or older than the window are not counted.
pub fn resolve_range(range: &StatsRange, today: NaiveDate) -> Result<ResolvedRange, StatsRangeError> {
    let (start, end) = match (range.start, range.end) {
        (None, None) => {
            return Ok(ResolvedRange {
                bounds: None,
                days: DEFAULT_STATS_WINDOW_DAYS,
            })
        }
        (Some(start), None) => (start, today),
        (None, Some(end)) => (end - Duration::days(DEFAULT_STATS_WINDOW_DAYS - 1), end),
        (Some(start), Some(end)) => (start, end),
    };

    if start > end {
        return Err(StatsRangeError::StartAfterEnd { start, end });
    }

    Ok(ResolvedRange {
        bounds: Some((start, end)),
        days: (end - start).num_days() + 1,
    })
}

/// Builds statistics rows, preserving the order of `habits`.
pub fn compute_habit_stats(
    habits: &[Habit],
    range: &StatsRange,
    today: NaiveDate,
) -> Result<Vec<HabitStats>, StatsRangeError> {
    let resolved = resolve_range(range, today)?;

    let stats = habits
        .iter()
        .filter(|habit| habit.is_active)
        .filter_map(|habit| {
            let in_range: Vec<_> = habit
                .completions
                .iter()
                .filter(|record| resolved.contains(record.date))
                .collect();

            if resolved.bounds.is_some() && in_range.is_empty() {
                return None;
            }

            let streak = recompute(&habit.completions, habit.target_value, today);
            let completion_count = in_range.len() as u32;
            let rate = f64::from(completion_count) / resolved.days as f64 * 100.0;

            Some(HabitStats {
                habit_id: habit.id,
                title: habit.title.clone(),
                category: habit.category,
                frequency: habit.frequency,
                target_value: habit.target_value,
                current_streak: streak.current,
                longest_streak: streak.longest,
                total_value: in_range.iter().map(|record| record.value).sum(),
                completion_count,
                completion_rate: rate.round() as u32,
            })
        })
        .collect();

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::{compute_habit_stats, resolve_range, StatsRange, StatsRangeError};
    use crate::model::completion::CompletionRecord;
    use crate::model::habit::Habit;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    fn habit_with_days(days: &[u32]) -> Habit {
        let mut habit = Habit::new(Uuid::new_v4(), "stretch");
        habit.completions = days
            .iter()
            .map(|d| CompletionRecord::new(day(*d), 2.0))
            .collect();
        habit.refresh_streak(day(30));
        habit
    }

    #[test]
    fn unbounded_range_uses_thirty_day_denominator() {
        let resolved = resolve_range(&StatsRange::default(), day(30)).unwrap();
        assert_eq!(resolved.bounds, None);
        assert_eq!(resolved.days, 30);
    }

    #[test]
    fn start_only_runs_through_today() {
        let range = StatsRange {
            start: Some(day(21)),
            end: None,
        };
        let resolved = resolve_range(&range, day(30)).unwrap();
        assert_eq!(resolved.bounds, Some((day(21), day(30))));
        assert_eq!(resolved.days, 10);
    }

    #[test]
    fn end_only_looks_back_thirty_days() {
        let range = StatsRange {
            start: None,
            end: Some(day(30)),
        };
        let resolved = resolve_range(&range, day(30)).unwrap();
        assert_eq!(resolved.bounds, Some((day(1), day(30))));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let range = StatsRange {
            start: Some(day(10)),
            end: Some(day(9)),
        };
        assert_eq!(
            resolve_range(&range, day(30)),
            Err(StatsRangeError::StartAfterEnd {
                start: day(10),
                end: day(9)
            })
        );
    }

    #[test]
    fn stats_count_sum_and_rate_inside_range() {
        let habit = habit_with_days(&[1, 5, 6, 7, 29, 30]);
        let range = StatsRange {
            start: Some(day(1)),
            end: Some(day(10)),
        };

        let stats = compute_habit_stats(&[habit], &range, day(30)).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].completion_count, 4);
        assert_eq!(stats[0].total_value, 8.0);
        assert_eq!(stats[0].completion_rate, 40);
        assert_eq!(stats[0].current_streak, 2);
        assert_eq!(stats[0].longest_streak, 3);
    }

    #[test]
    fn inactive_and_out_of_range_habits_are_skipped() {
        let mut inactive = habit_with_days(&[2]);
        inactive.is_active = false;
        let outside = habit_with_days(&[25]);
        let inside = habit_with_days(&[3]);

        let range = StatsRange {
            start: Some(day(1)),
            end: Some(day(5)),
        };
        let stats = compute_habit_stats(&[inactive, outside, inside.clone()], &range, day(30))
            .unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].habit_id, inside.id);
    }

    #[test]
    fn stale_stored_streak_is_recomputed_for_today() {
        let mut habit = habit_with_days(&[6, 7, 8, 9, 10]);
        habit.refresh_streak(day(10));
        assert_eq!(habit.streak.current, 5);

        let stats = compute_habit_stats(&[habit], &StatsRange::default(), day(20)).unwrap();
        assert_eq!(stats[0].current_streak, 0);
        assert_eq!(stats[0].longest_streak, 5);
    }

    #[test]
    fn unbounded_stats_keep_habits_without_completions() {
        let empty = habit_with_days(&[]);
        let stats = compute_habit_stats(&[empty], &StatsRange::default(), day(30)).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].completion_count, 0);
        assert_eq!(stats[0].completion_rate, 0);
    }
}
