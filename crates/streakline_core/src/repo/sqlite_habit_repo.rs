//! SQLite-backed habit store.
//!
//! # Responsibility
//! - Map `Habit` to the `habits` row and `habit_completions` child rows.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Mutations run inside one `BEGIN IMMEDIATE` transaction, so a concurrent
//!   writer on another connection waits (busy timeout) instead of interleaving.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::completion::{format_calendar_day, CompletionRecord, CALENDAR_DAY_FORMAT};
use crate::model::habit::{Habit, HabitCategory, HabitFrequency, HabitId, OwnerId, Reminder};
use crate::model::now_epoch_ms;
use crate::repo::habit_repo::{
    apply_mutation, HabitListQuery, HabitMutation, HabitRepository, RepoError, RepoResult,
};
use crate::streak::StreakState;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const HABIT_SELECT_SQL: &str = "SELECT
    uuid,
    owner_uuid,
    title,
    description,
    category,
    frequency,
    target_value,
    unit,
    color,
    icon,
    is_active,
    streak_current,
    streak_longest,
    streak_last_completed,
    reminders_json,
    created_at,
    updated_at
FROM habits";

const REQUIRED_TABLES: [&str; 2] = ["habits", "habit_completions"];

/// Habit repository over a migrated SQLite connection.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the schema has not been migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &Habit) -> RepoResult<HabitId> {
        habit.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if habit_exists(&tx, habit.id)? {
            return Err(RepoError::AlreadyExists(habit.id));
        }
        insert_habit_row(&tx, habit)?;
        replace_completions(&tx, habit)?;
        tx.commit()?;

        Ok(habit.id)
    }

    fn get_habit(&self, owner: OwnerId, id: HabitId) -> RepoResult<Option<Habit>> {
        load_habit(self.conn, owner, id)
    }

    fn list_habits(&self, query: &HabitListQuery) -> RepoResult<Vec<Habit>> {
        let mut sql = format!("{HABIT_SELECT_SQL} WHERE owner_uuid = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(query.owner.to_string())];

        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }
        if let Some(frequency) = query.frequency {
            sql.push_str(" AND frequency = ?");
            bind_values.push(Value::Text(frequency.as_str().to_string()));
        }
        if let Some(is_active) = query.is_active {
            sql.push_str(" AND is_active = ?");
            bind_values.push(Value::Integer(bool_to_int(is_active)));
        }
        sql.push_str(" ORDER BY created_at DESC, uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }

        for habit in &mut habits {
            habit.completions = load_completions(self.conn, habit.id)?;
            habit.validate()?;
        }

        Ok(habits)
    }

    fn mutate_habit(
        &self,
        owner: OwnerId,
        id: HabitId,
        mutation: HabitMutation<'_>,
    ) -> RepoResult<Habit> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut habit = load_habit(&tx, owner, id)?.ok_or(RepoError::NotFound(id))?;

        apply_mutation(&mut habit, mutation, now_epoch_ms())?;
        update_habit_row(&tx, &habit)?;
        replace_completions(&tx, &habit)?;
        tx.commit()?;

        Ok(habit)
    }

    fn delete_habit(&self, owner: OwnerId, id: HabitId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM habits WHERE uuid = ?1 AND owner_uuid = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn load_habit(conn: &Connection, owner: OwnerId, id: HabitId) -> RepoResult<Option<Habit>> {
    let mut stmt = conn.prepare(&format!(
        "{HABIT_SELECT_SQL} WHERE uuid = ?1 AND owner_uuid = ?2;"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), owner.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut habit = parse_habit_row(row)?;
    habit.completions = load_completions(conn, habit.id)?;
    habit.validate()?;
    Ok(Some(habit))
}

fn load_completions(conn: &Connection, habit_id: HabitId) -> RepoResult<Vec<CompletionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT completion_date, value, notes, completed_at
         FROM habit_completions
         WHERE habit_uuid = ?1
         ORDER BY completion_date ASC;",
    )?;
    let mut rows = stmt.query([habit_id.to_string()])?;
    let mut completions = Vec::new();
    while let Some(row) = rows.next()? {
        let date_text: String = row.get("completion_date")?;
        completions.push(CompletionRecord {
            date: parse_date(&date_text, "habit_completions.completion_date")?,
            value: row.get("value")?,
            notes: row.get("notes")?,
            completed_at: row.get("completed_at")?,
        });
    }
    Ok(completions)
}

fn insert_habit_row(conn: &Connection, habit: &Habit) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO habits (
            uuid,
            owner_uuid,
            title,
            description,
            category,
            frequency,
            target_value,
            unit,
            color,
            icon,
            is_active,
            streak_current,
            streak_longest,
            streak_last_completed,
            reminders_json,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
        params![
            habit.id.to_string(),
            habit.owner.to_string(),
            habit.title.as_str(),
            habit.description.as_deref(),
            habit.category.as_str(),
            habit.frequency.as_str(),
            habit.target_value,
            habit.unit.as_str(),
            habit.color.as_str(),
            habit.icon.as_str(),
            bool_to_int(habit.is_active),
            habit.streak.current,
            habit.streak.longest,
            habit.streak.last_completed.map(format_calendar_day),
            reminders_to_json(&habit.reminders)?,
            habit.created_at,
            habit.updated_at,
        ],
    )?;
    Ok(())
}

fn update_habit_row(conn: &Connection, habit: &Habit) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE habits
         SET
            title = ?1,
            description = ?2,
            category = ?3,
            frequency = ?4,
            target_value = ?5,
            unit = ?6,
            color = ?7,
            icon = ?8,
            is_active = ?9,
            streak_current = ?10,
            streak_longest = ?11,
            streak_last_completed = ?12,
            reminders_json = ?13,
            updated_at = ?14
         WHERE uuid = ?15 AND owner_uuid = ?16;",
        params![
            habit.title.as_str(),
            habit.description.as_deref(),
            habit.category.as_str(),
            habit.frequency.as_str(),
            habit.target_value,
            habit.unit.as_str(),
            habit.color.as_str(),
            habit.icon.as_str(),
            bool_to_int(habit.is_active),
            habit.streak.current,
            habit.streak.longest,
            habit.streak.last_completed.map(format_calendar_day),
            reminders_to_json(&habit.reminders)?,
            habit.updated_at,
            habit.id.to_string(),
            habit.owner.to_string(),
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound(habit.id));
    }
    Ok(())
}

fn replace_completions(conn: &Connection, habit: &Habit) -> RepoResult<()> {
    let habit_uuid = habit.id.to_string();
    conn.execute(
        "DELETE FROM habit_completions WHERE habit_uuid = ?1;",
        [habit_uuid.as_str()],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO habit_completions (habit_uuid, completion_date, value, notes, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5);",
    )?;
    for record in &habit.completions {
        stmt.execute(params![
            habit_uuid.as_str(),
            format_calendar_day(record.date),
            record.value,
            record.notes.as_deref(),
            record.completed_at,
        ])?;
    }
    Ok(())
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    let id = parse_uuid(&row.get::<_, String>("uuid")?, "habits.uuid")?;
    let owner = parse_uuid(&row.get::<_, String>("owner_uuid")?, "habits.owner_uuid")?;

    let category_text: String = row.get("category")?;
    let category = HabitCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid category `{category_text}` in habits.category"))
    })?;

    let frequency_text: String = row.get("frequency")?;
    let frequency = HabitFrequency::parse(&frequency_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid frequency `{frequency_text}` in habits.frequency"
        ))
    })?;

    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_active value `{other}` in habits.is_active"
            )));
        }
    };

    let last_completed = match row.get::<_, Option<String>>("streak_last_completed")? {
        Some(value) => Some(parse_date(&value, "habits.streak_last_completed")?),
        None => None,
    };

    let reminders_json: String = row.get("reminders_json")?;
    let reminders: Vec<Reminder> = serde_json::from_str(&reminders_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid reminders in habits.reminders_json: {err}"))
    })?;

    Ok(Habit {
        id,
        owner,
        title: row.get("title")?,
        description: row.get("description")?,
        category,
        frequency,
        target_value: row.get("target_value")?,
        unit: row.get("unit")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        is_active,
        streak: StreakState {
            current: row.get("streak_current")?,
            longest: row.get("streak_longest")?,
            last_completed,
        },
        completions: Vec::new(),
        reminders,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, CALENDAR_DAY_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn reminders_to_json(reminders: &[Reminder]) -> RepoResult<String> {
    serde_json::to_string(reminders)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode reminders: {err}")))
}

fn habit_exists(conn: &Connection, id: HabitId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM habits WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
