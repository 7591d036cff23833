//! Streak computation over habit completion records.
//!
//! # Responsibility
//! - Derive current/longest streaks from an unordered completion snapshot.
//!
//! # Invariants
//! - Computation is pure: no I/O, no shared state, no clock access.
//! - `StreakState::longest >= StreakState::current`.
//! - The active grace window is one calendar day for every habit frequency.

mod calculator;

pub use calculator::{recompute, StreakState, ACTIVE_GRACE_DAYS};
