//! Habit domain model.
//!
//! # Responsibility
//! - Define canonical habit and completion structures used by core logic.
//! - Own the upsert-by-date completion rule and streak refresh.
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId` and scoped to one owner.
//! - Streak state is derived, never edited directly by callers.

pub mod completion;
pub mod habit;

/// Current wall-clock time in unix epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
