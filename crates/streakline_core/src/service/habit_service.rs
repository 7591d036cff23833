//! Habit use-case service.
//!
//! # Responsibility
//! - Provide create/read/update/delete and complete/uncomplete entry points.
//! - Recompute streaks on every completion or target change.
//!
//! # Invariants
//! - Completion changes go through `HabitRepository::mutate_habit`, never a
//!   separate read then write.
//! - `today` is supplied by the caller; the service never reads the clock for
//!   streak purposes.
//! - Log events carry ids and counters only, never titles or notes.

use crate::model::completion::{format_calendar_day, CompletionRecord};
use crate::model::habit::{
    CompletionChange, Habit, HabitCategory, HabitFrequency, HabitId, HabitUpdate,
    HabitValidationError, OwnerId, Reminder, DEFAULT_TARGET_VALUE,
};
use crate::repo::habit_repo::{HabitListQuery, HabitRepository, RepoError};
use crate::service::stats::{compute_habit_stats, HabitStats, StatsRange, StatsRangeError};
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum HabitServiceError {
    /// Input or resulting habit breaks a model invariant.
    Validation(HabitValidationError),
    /// Habit does not exist for this owner.
    HabitNotFound(HabitId),
    /// Stats range bounds are reversed.
    InvalidRange(StatsRangeError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::InvalidRange(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidRange(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::HabitNotFound(_) => None,
        }
    }
}

impl From<RepoError> for HabitServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::HabitNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<HabitValidationError> for HabitServiceError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StatsRangeError> for HabitServiceError {
    fn from(value: StatsRangeError) -> Self {
        Self::InvalidRange(value)
    }
}

pub type ServiceResult<T> = Result<T, HabitServiceError>;

/// Request model for creating a habit. Missing fields take model defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewHabit {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<HabitCategory>,
    pub frequency: Option<HabitFrequency>,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub reminders: Vec<Reminder>,
}

/// Request model for logging a completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompleteHabit {
    /// Defaults to `today`.
    pub date: Option<NaiveDate>,
    /// Defaults to 1.
    pub value: Option<f64>,
    pub notes: Option<String>,
}

/// Habit service facade over a repository implementation.
pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a habit for `owner`.
    pub fn create_habit(&self, owner: OwnerId, request: NewHabit) -> ServiceResult<Habit> {
        let mut habit = Habit::new(owner, request.title);
        HabitUpdate {
            description: Some(request.description),
            category: request.category,
            frequency: request.frequency,
            target_value: request.target_value,
            unit: request.unit,
            color: request.color,
            icon: request.icon,
            reminders: Some(request.reminders),
            ..HabitUpdate::default()
        }
        .apply_to(&mut habit);

        let result = self
            .repo
            .create_habit(&habit)
            .map(|_| habit)
            .map_err(HabitServiceError::from);
        log_outcome("habit_create", owner, None, &result);
        result
    }

    /// Gets one habit owned by `owner`.
    pub fn get_habit(&self, owner: OwnerId, id: HabitId) -> ServiceResult<Habit> {
        self.repo
            .get_habit(owner, id)?
            .ok_or(HabitServiceError::HabitNotFound(id))
    }

    /// Lists habits matching `query`, newest first.
    pub fn list_habits(&self, query: &HabitListQuery) -> ServiceResult<Vec<Habit>> {
        Ok(self.repo.list_habits(query)?)
    }

    /// Applies a partial metadata update and refreshes the streak, since the
    /// target value may have changed.
    ///
    /// The updated habit is validated before the streak is recomputed, so a
    /// bad target comes back as `Validation` and nothing is stored.
    pub fn update_habit(
        &self,
        owner: OwnerId,
        id: HabitId,
        update: &HabitUpdate,
        today: NaiveDate,
    ) -> ServiceResult<Habit> {
        let result = self
            .repo
            .mutate_habit(owner, id, &mut |habit: &mut Habit| {
                update.apply_to(habit);
                habit.validate()?;
                habit.refresh_streak(today);
                Ok(())
            })
            .map_err(HabitServiceError::from);
        log_outcome("habit_update", owner, Some(id), &result);
        result
    }

    /// Deletes a habit and all of its completions.
    pub fn delete_habit(&self, owner: OwnerId, id: HabitId) -> ServiceResult<()> {
        let result = self
            .repo
            .delete_habit(owner, id)
            .map_err(HabitServiceError::from);
        log_outcome("habit_delete", owner, Some(id), &result);
        result
    }

    /// Logs a completion, replacing any record already on that date.
    ///
    /// # Contract
    /// - `date` defaults to `today`, `value` defaults to 1.
    /// - The streak is recomputed before the habit is stored.
    pub fn complete_habit(
        &self,
        owner: OwnerId,
        id: HabitId,
        request: CompleteHabit,
        today: NaiveDate,
    ) -> ServiceResult<Habit> {
        let date = request.date.unwrap_or(today);
        let record = CompletionRecord::new(date, request.value.unwrap_or(DEFAULT_TARGET_VALUE))
            .with_notes(request.notes);

        let result = self
            .repo
            .mutate_habit(owner, id, &mut |habit: &mut Habit| {
                habit.apply_completion_change(CompletionChange::Upsert(record.clone()), today);
                Ok(())
            })
            .map_err(HabitServiceError::from);
        log_streak_outcome("habit_complete", id, date, &result);
        result
    }

    /// Removes the completion on `date` (default `today`) and recomputes the
    /// streak from the remaining records. Missing records are not an error.
    pub fn uncomplete_habit(
        &self,
        owner: OwnerId,
        id: HabitId,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> ServiceResult<Habit> {
        let date = date.unwrap_or(today);
        let result = self
            .repo
            .mutate_habit(owner, id, &mut |habit: &mut Habit| {
                habit.apply_completion_change(CompletionChange::Remove(date), today);
                Ok(())
            })
            .map_err(HabitServiceError::from);
        log_streak_outcome("habit_uncomplete", id, date, &result);
        result
    }

    /// Completion statistics for the owner's active habits.
    pub fn habit_stats(
        &self,
        owner: OwnerId,
        range: &StatsRange,
        today: NaiveDate,
    ) -> ServiceResult<Vec<HabitStats>> {
        let query = HabitListQuery {
            is_active: Some(true),
            ..HabitListQuery::for_owner(owner)
        };
        let habits = self.repo.list_habits(&query)?;
        let stats = compute_habit_stats(&habits, range, today)?;

        info!(
            "event=habit_stats module=service status=ok owner={} habits={} rows={}",
            owner,
            habits.len(),
            stats.len()
        );
        Ok(stats)
    }
}

fn log_outcome<T>(
    event: &str,
    owner: OwnerId,
    habit_id: Option<HabitId>,
    result: &ServiceResult<T>,
) {
    let habit_id = habit_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match result {
        Ok(_) => info!("event={event} module=service status=ok owner={owner} habit_id={habit_id}"),
        Err(err) => warn!(
            "event={event} module=service status=error owner={owner} habit_id={habit_id} error={err}"
        ),
    }
}

fn log_streak_outcome(
    event: &str,
    habit_id: HabitId,
    date: NaiveDate,
    result: &ServiceResult<Habit>,
) {
    let date = format_calendar_day(date);
    match result {
        Ok(habit) => info!(
            "event={event} module=service status=ok habit_id={habit_id} date={date} completions={} current={} longest={}",
            habit.completions.len(),
            habit.streak.current,
            habit.streak.longest
        ),
        Err(err) => warn!(
            "event={event} module=service status=error habit_id={habit_id} date={date} error={err}"
        ),
    }
}
