//! Habit storage contracts and implementations.
//!
//! # Responsibility
//! - Define the storage seam services depend on.
//! - Provide SQLite and in-memory stores behind the same contract.
//!
//! # Invariants
//! - Writes call `Habit::validate()` before anything is stored.
//! - Read-modify-write of one habit is serialized by the store.

pub mod habit_repo;
pub mod memory_habit_repo;
pub mod sqlite_habit_repo;
