//! Core habit-tracking logic for Streakline.
//! This crate owns the streak rules and every invariant around completions.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod streak;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::completion::{
    calendar_day_from_epoch_ms, parse_calendar_day, CalendarDayError, CompletionRecord,
};
pub use model::habit::{
    CompletionChange, Habit, HabitCategory, HabitFrequency, HabitId, HabitUpdate,
    HabitValidationError, OwnerId, Reminder,
};
pub use repo::habit_repo::{HabitListQuery, HabitRepository, RepoError, RepoResult};
pub use repo::memory_habit_repo::InMemoryHabitRepository;
pub use repo::sqlite_habit_repo::SqliteHabitRepository;
pub use service::habit_service::{CompleteHabit, HabitService, HabitServiceError, NewHabit};
pub use service::stats::{HabitStats, StatsRange};
pub use streak::{recompute as recompute_streak, StreakState};

/// Today's calendar day in the local timezone.
///
/// Callers that track users in other timezones should pass their own
/// `today` to the service instead.
pub fn today_local() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
