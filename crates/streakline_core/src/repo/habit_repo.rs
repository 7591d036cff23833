//! Habit repository contract.
//!
//! # Responsibility
//! - Describe owner-scoped CRUD over habits and their completions.
//! - Provide the single atomic mutation entry point used for completions.
//!
//! # Invariants
//! - `mutate_habit` never exposes a half-applied completion collection.
//! - `id`, `owner` and `created_at` survive a mutation unchanged.

use crate::db::DbError;
use crate::model::habit::{
    Habit, HabitCategory, HabitFrequency, HabitId, HabitValidationError, OwnerId,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Closure applied to a locked habit snapshot inside `mutate_habit`.
pub type HabitMutation<'a> = &'a mut dyn FnMut(&mut Habit) -> Result<(), HabitValidationError>;

/// Repository error for habit persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(HabitValidationError),
    Db(DbError),
    NotFound(HabitId),
    AlreadyExists(HabitId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    /// A thread panicked while holding the in-memory store lock.
    StoragePoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "habit already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::StoragePoisoned => write!(f, "habit store lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filters for listing one owner's habits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitListQuery {
    pub owner: OwnerId,
    pub category: Option<HabitCategory>,
    pub frequency: Option<HabitFrequency>,
    pub is_active: Option<bool>,
}

impl HabitListQuery {
    /// Unfiltered query over every habit of `owner`.
    pub fn for_owner(owner: OwnerId) -> Self {
        Self {
            owner,
            category: None,
            frequency: None,
            is_active: None,
        }
    }

    /// Returns whether `habit` passes this query's filters.
    pub fn matches(&self, habit: &Habit) -> bool {
        habit.owner == self.owner
            && self.category.is_none_or(|category| habit.category == category)
            && self.frequency.is_none_or(|frequency| habit.frequency == frequency)
            && self.is_active.is_none_or(|is_active| habit.is_active == is_active)
    }
}

/// Storage seam for habits.
///
/// Lists are ordered by `created_at DESC, id ASC`. Lookups by another owner's
/// id behave as if the habit did not exist.
pub trait HabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId>;
    fn get_habit(&self, owner: OwnerId, id: HabitId) -> RepoResult<Option<Habit>>;
    fn list_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>>;
    /// Loads, mutates, validates and stores one habit atomically.
    ///
    /// Returns the stored habit. `updated_at` is bumped by the store.
    fn mutate_habit(
        &self,
        owner: OwnerId,
        id: HabitId,
        mutation: HabitMutation<'_>,
    ) -> RepoResult<Habit>;
    fn delete_habit(&self, owner: OwnerId, id: HabitId) -> RepoResult<()>;
}

impl<R: HabitRepository + ?Sized> HabitRepository for Arc<R> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        (**self).create_habit(habit)
    }

    fn get_habit(&self, owner: OwnerId, id: HabitId) -> RepoResult<Option<Habit>> {
        (**self).get_habit(owner, id)
    }

    fn list_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>> {
        (**self).list_habits(query)
    }

    fn mutate_habit(
        &self,
        owner: OwnerId,
        id: HabitId,
        mutation: HabitMutation<'_>,
    ) -> RepoResult<Habit> {
        (**self).mutate_habit(owner, id, mutation)
    }

    fn delete_habit(&self, owner: OwnerId, id: HabitId) -> RepoResult<()> {
        (**self).delete_habit(owner, id)
    }
}

/// Runs `mutation` on `habit` and restores store-owned fields afterwards.
pub(crate) fn apply_mutation(
    habit: &mut Habit,
    mutation: HabitMutation<'_>,
    now_epoch_ms: i64,
) -> RepoResult<()> {
    let (id, owner, created_at) = (habit.id, habit.owner, habit.created_at);
    mutation(habit)?;
    habit.id = id;
    habit.owner = owner;
    habit.created_at = created_at;
    habit.updated_at = now_epoch_ms.max(habit.updated_at);
    habit.validate()?;
    Ok(())
}
