//! Completion record model and calendar-day normalization.
//!
//! # Responsibility
//! - Define the per-date completion entry owned by a habit.
//! - Normalize caller-supplied timestamps/strings into calendar days.
//!
//! # Invariants
//! - `date` carries no time-of-day; comparisons are calendar-day only.
//! - A habit holds at most one record per `date` (enforced by `Habit`).

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wire/storage format for calendar days.
pub const CALENDAR_DAY_FORMAT: &str = "%Y-%m-%d";

/// One logged completion of a habit on a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Calendar day the completion belongs to.
    pub date: NaiveDate,
    /// Amount logged, compared against the habit target.
    pub value: f64,
    /// Optional free-form note.
    #[serde(default)]
    pub notes: Option<String>,
    /// Unix epoch milliseconds of the last write to this record.
    #[serde(default)]
    pub completed_at: i64,
}

impl CompletionRecord {
    /// Creates a record stamped with the current wall-clock time.
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            notes: None,
            completed_at: crate::model::now_epoch_ms(),
        }
    }

    /// Attaches a note, dropping it when blank after trim.
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = normalize_optional_text(notes);
        self
    }

    /// Returns whether this record meets `target_value`.
    pub fn qualifies(&self, target_value: f64) -> bool {
        self.value >= target_value
    }
}

pub(crate) fn normalize_optional_text(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Boundary error for values that cannot be reduced to a calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarDayError {
    /// Input is empty after trim.
    Empty,
    /// Input is neither `YYYY-MM-DD` nor RFC 3339.
    Unparseable(String),
    /// Epoch milliseconds fall outside the supported calendar.
    OutOfRange(i64),
}

impl Display for CalendarDayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "calendar day must not be empty"),
            Self::Unparseable(value) => write!(
                f,
                "invalid calendar day `{value}`; expected YYYY-MM-DD or RFC 3339"
            ),
            Self::OutOfRange(epoch_ms) => {
                write!(f, "epoch milliseconds {epoch_ms} are out of calendar range")
            }
        }
    }
}

impl Error for CalendarDayError {}

/// Parses a calendar day from `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps keep their own local date; the time-of-day is discarded.
pub fn parse_calendar_day(value: &str) -> Result<NaiveDate, CalendarDayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CalendarDayError::Empty);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, CALENDAR_DAY_FORMAT) {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| CalendarDayError::Unparseable(trimmed.to_string()))
}

/// Converts epoch milliseconds to the UTC calendar day.
pub fn calendar_day_from_epoch_ms(epoch_ms: i64) -> Result<NaiveDate, CalendarDayError> {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|timestamp| timestamp.date_naive())
        .ok_or(CalendarDayError::OutOfRange(epoch_ms))
}

/// Formats a calendar day for storage and display.
pub fn format_calendar_day(date: NaiveDate) -> String {
    date.format(CALENDAR_DAY_FORMAT).to_string()
}
