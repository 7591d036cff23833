//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record and its reminder/category metadata.
//! - Apply completion changes and keep derived streak state in sync.
//!
//! # Invariants
//! - `target_value` is finite and strictly positive.
//! - `completions` holds at most one record per calendar day.
//! - `streak` is recomputed after every completion change or target change.

use crate::model::completion::{normalize_optional_text, CompletionRecord};
use crate::model::now_epoch_ms;
use crate::streak::{recompute, StreakState};
use chrono::{NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static REMINDER_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[01]\d|2[0-3]):[0-5]\d$").expect("valid reminder time regex"));

pub const DEFAULT_TARGET_VALUE: f64 = 1.0;
pub const DEFAULT_UNIT: &str = "times";
pub const DEFAULT_COLOR: &str = "#8B5CF6";
pub const DEFAULT_ICON: &str = "🎯";

/// Stable identifier of a habit.
pub type HabitId = Uuid;
/// Stable identifier of the user owning a habit.
pub type OwnerId = Uuid;

/// Grouping used by list filters and statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitCategory {
    Health,
    Productivity,
    Learning,
    Social,
    #[default]
    Personal,
    Other,
}

impl HabitCategory {
    /// Stable string id used in storage and CLI input.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Productivity => "productivity",
            Self::Learning => "learning",
            Self::Social => "social",
            Self::Personal => "personal",
            Self::Other => "other",
        }
    }

    /// Parses a stable string id, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "health" => Some(Self::Health),
            "productivity" => Some(Self::Productivity),
            "learning" => Some(Self::Learning),
            "social" => Some(Self::Social),
            "personal" => Some(Self::Personal),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Intended repetition period of a habit.
///
/// Streaks are still computed on consecutive calendar days for every
/// frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl HabitFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Reminder schedule attached to a habit. Delivery happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// 24h wall-clock time, `HH:MM`.
    pub time: String,
    /// Weekdays the reminder fires on.
    #[serde(default)]
    pub days: Vec<Weekday>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Habit model validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HabitValidationError {
    NilId,
    EmptyTitle,
    InvalidTargetValue(f64),
    InvalidReminderTime(String),
    InvalidCompletionValue { date: NaiveDate, value: f64 },
    DuplicateCompletionDate(NaiveDate),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "habit id must not be nil"),
            Self::EmptyTitle => write!(f, "habit title must not be blank"),
            Self::InvalidTargetValue(value) => {
                write!(f, "target value must be a positive number, got {value}")
            }
            Self::InvalidReminderTime(value) => {
                write!(f, "reminder time `{value}` must use HH:MM (24h)")
            }
            Self::InvalidCompletionValue { date, value } => {
                write!(f, "completion value on {date} must be finite, got {value}")
            }
            Self::DuplicateCompletionDate(date) => {
                write!(f, "more than one completion recorded for {date}")
            }
        }
    }
}

impl Error for HabitValidationError {}

/// A mutation applied to a habit's completion collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionChange {
    /// Insert the record, or overwrite value/notes of the record on that day.
    Upsert(CompletionRecord),
    /// Remove the record on that day if one exists.
    Remove(NaiveDate),
}

/// Canonical habit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub owner: OwnerId,
    pub title: String,
    pub description: Option<String>,
    pub category: HabitCategory,
    pub frequency: HabitFrequency,
    /// Minimum logged value for a completion to count toward streaks.
    pub target_value: f64,
    pub unit: String,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
    /// Derived from `completions` and `target_value`.
    pub streak: StreakState,
    pub completions: Vec<CompletionRecord>,
    pub reminders: Vec<Reminder>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Habit {
    /// Creates a habit with default metadata and a generated id.
    pub fn new(owner: OwnerId, title: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            owner,
            title: title.into().trim().to_string(),
            description: None,
            category: HabitCategory::default(),
            frequency: HabitFrequency::default(),
            target_value: DEFAULT_TARGET_VALUE,
            unit: DEFAULT_UNIT.to_string(),
            color: DEFAULT_COLOR.to_string(),
            icon: DEFAULT_ICON.to_string(),
            is_active: true,
            streak: StreakState::default(),
            completions: Vec::new(),
            reminders: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks model invariants before persistence.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.id.is_nil() {
            return Err(HabitValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(HabitValidationError::EmptyTitle);
        }
        if !self.target_value.is_finite() || self.target_value <= 0.0 {
            return Err(HabitValidationError::InvalidTargetValue(self.target_value));
        }
        if let Some(reminder) = self
            .reminders
            .iter()
            .find(|reminder| !REMINDER_TIME_RE.is_match(&reminder.time))
        {
            return Err(HabitValidationError::InvalidReminderTime(
                reminder.time.clone(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.completions.len());
        for record in &self.completions {
            if !record.value.is_finite() {
                return Err(HabitValidationError::InvalidCompletionValue {
                    date: record.date,
                    value: record.value,
                });
            }
            if !seen.insert(record.date) {
                return Err(HabitValidationError::DuplicateCompletionDate(record.date));
            }
        }

        Ok(())
    }

    /// Returns the completion recorded on `date`, if any.
    pub fn completion_on(&self, date: NaiveDate) -> Option<&CompletionRecord> {
        self.completions.iter().find(|record| record.date == date)
    }

    /// Applies one completion change and recomputes the streak.
    ///
    /// Returns whether the completion collection changed.
    pub fn apply_completion_change(&mut self, change: CompletionChange, today: NaiveDate) -> bool {
        let changed = match change {
            CompletionChange::Upsert(record) => {
                match self
                    .completions
                    .iter_mut()
                    .find(|existing| existing.date == record.date)
                {
                    Some(existing) => {
                        existing.value = record.value;
                        existing.notes = normalize_optional_text(record.notes);
                        existing.completed_at = record.completed_at;
                    }
                    None => self.completions.push(CompletionRecord {
                        notes: normalize_optional_text(record.notes),
                        ..record
                    }),
                }
                true
            }
            CompletionChange::Remove(date) => {
                let before = self.completions.len();
                self.completions.retain(|record| record.date != date);
                self.completions.len() != before
            }
        };

        self.refresh_streak(today);
        changed
    }

    /// Recomputes derived streak state from the full completion set.
    pub fn refresh_streak(&mut self, today: NaiveDate) {
        self.streak = recompute(&self.completions, self.target_value, today);
    }
}

/// Partial metadata update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitUpdate {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub category: Option<HabitCategory>,
    pub frequency: Option<HabitFrequency>,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
    pub reminders: Option<Vec<Reminder>>,
}

impl HabitUpdate {
    /// Copies set fields onto `habit`. Does not validate or refresh streaks.
    pub fn apply_to(&self, habit: &mut Habit) {
        if let Some(title) = &self.title {
            habit.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            habit.description = normalize_optional_text(description.clone());
        }
        if let Some(category) = self.category {
            habit.category = category;
        }
        if let Some(frequency) = self.frequency {
            habit.frequency = frequency;
        }
        if let Some(target_value) = self.target_value {
            habit.target_value = target_value;
        }
        if let Some(unit) = &self.unit {
            habit.unit = unit.clone();
        }
        if let Some(color) = &self.color {
            habit.color = color.clone();
        }
        if let Some(icon) = &self.icon {
            habit.icon = icon.clone();
        }
        if let Some(is_active) = self.is_active {
            habit.is_active = is_active;
        }
        if let Some(reminders) = &self.reminders {
            habit.reminders = reminders.clone();
        }
    }
}
