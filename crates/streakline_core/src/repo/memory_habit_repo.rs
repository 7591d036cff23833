//! In-memory habit store.
//!
//! # Responsibility
//! - Back services when no database is configured, and in tests.
//!
//! # Invariants
//! - One mutex guards the whole map; `mutate_habit` holds it from load to
//!   store, so concurrent completions on one habit never interleave.
//! - Stored values are clones; callers never alias store state.

use crate::model::habit::{Habit, HabitId, OwnerId};
use crate::model::now_epoch_ms;
use crate::repo::habit_repo::{
    apply_mutation, HabitListQuery, HabitMutation, HabitRepository, RepoError, RepoResult,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Process-local habit store. Share it across threads with `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryHabitRepository {
    habits: Mutex<HashMap<HabitId, Habit>>,
}

impl InMemoryHabitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, HashMap<HabitId, Habit>>> {
        self.habits.lock().map_err(|_| RepoError::StoragePoisoned)
    }
}

impl HabitRepository for InMemoryHabitRepository {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;

        let mut habits = self.lock()?;
        if habits.contains_key(&habit.id) {
            return Err(RepoError::AlreadyExists(habit.id));
        }
        habits.insert(habit.id, habit.clone());
        Ok(habit.id)
    }

    fn get_habit(&self, owner: OwnerId, id: HabitId) -> RepoResult<Option<Habit>> {
        let habits = self.lock()?;
        Ok(habits
            .get(&id)
            .filter(|habit| habit.owner == owner)
            .cloned())
    }

    fn list_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>> {
        let habits = self.lock()?;
        let mut matched: Vec<Habit> = habits
            .values()
            .filter(|habit| query.matches(habit))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(matched)
    }

    fn mutate_habit(
        &self,
        owner: OwnerId,
        id: HabitId,
        mutation: HabitMutation<'_>,
    ) -> RepoResult<Habit> {
        let mut habits = self.lock()?;
        let stored = habits
            .get_mut(&id)
            .filter(|habit| habit.owner == owner)
            .ok_or(RepoError::NotFound(id))?;

        let mut working = stored.clone();
        apply_mutation(&mut working, mutation, now_epoch_ms())?;
        *stored = working.clone();
        Ok(working)
    }

    fn delete_habit(&self, owner: OwnerId, id: HabitId) -> RepoResult<()> {
        let mut habits = self.lock()?;
        match habits.get(&id) {
            Some(habit) if habit.owner == owner => {
                habits.remove(&id);
                Ok(())
            }
            _ => Err(RepoError::NotFound(id)),
        }
    }
}
