use chrono::{Duration, NaiveDate, Weekday};
use streakline_core::{
    CompletionChange, CompletionRecord, Habit, HabitCategory, HabitFrequency, HabitUpdate,
    HabitValidationError, Reminder,
};
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
}

fn days_ago(offset: i64) -> NaiveDate {
    today() - Duration::days(offset)
}

#[test]
fn habit_new_sets_defaults() {
    let owner = Uuid::new_v4();
    let habit = Habit::new(owner, "  Read 20 pages ");

    assert!(!habit.id.is_nil());
    assert_eq!(habit.owner, owner);
    assert_eq!(habit.title, "Read 20 pages");
    assert_eq!(habit.category, HabitCategory::Personal);
    assert_eq!(habit.frequency, HabitFrequency::Daily);
    assert_eq!(habit.target_value, 1.0);
    assert_eq!(habit.unit, "times");
    assert_eq!(habit.color, "#8B5CF6");
    assert!(habit.is_active);
    assert_eq!(habit.streak.current, 0);
    assert_eq!(habit.streak.last_completed, None);
    assert!(habit.validate().is_ok());
}

#[test]
fn validate_rejects_bad_target_values() {
    let mut habit = Habit::new(Uuid::new_v4(), "run");

    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        habit.target_value = bad;
        assert!(matches!(
            habit.validate(),
            Err(HabitValidationError::InvalidTargetValue(_))
        ));
    }
}

#[test]
fn validate_rejects_blank_title_and_bad_reminder() {
    let mut habit = Habit::new(Uuid::new_v4(), "   ");
    assert_eq!(habit.validate(), Err(HabitValidationError::EmptyTitle));

    habit.title = "meditate".to_string();
    habit.reminders = vec![Reminder {
        time: "24:15".to_string(),
        days: vec![Weekday::Mon],
        is_active: true,
    }];
    assert_eq!(
        habit.validate(),
        Err(HabitValidationError::InvalidReminderTime("24:15".to_string()))
    );

    habit.reminders[0].time = "07:30".to_string();
    assert!(habit.validate().is_ok());
}

#[test]
fn validate_rejects_duplicate_completion_dates() {
    let mut habit = Habit::new(Uuid::new_v4(), "water");
    habit.completions = vec![
        CompletionRecord::new(today(), 1.0),
        CompletionRecord::new(today(), 2.0),
    ];
    assert_eq!(
        habit.validate(),
        Err(HabitValidationError::DuplicateCompletionDate(today()))
    );
}

#[test]
fn upsert_replaces_record_on_same_date() {
    let mut habit = Habit::new(Uuid::new_v4(), "pushups");
    habit.target_value = 20.0;

    let first = CompletionRecord::new(today(), 10.0).with_notes(Some("tired".to_string()));
    assert!(habit.apply_completion_change(CompletionChange::Upsert(first), today()));
    assert_eq!(habit.streak.current, 0);

    let second = CompletionRecord::new(today(), 25.0);
    assert!(habit.apply_completion_change(CompletionChange::Upsert(second), today()));

    assert_eq!(habit.completions.len(), 1);
    let stored = habit.completion_on(today()).unwrap();
    assert_eq!(stored.value, 25.0);
    assert_eq!(stored.notes, None);
    assert_eq!(habit.streak.current, 1);
    assert_eq!(habit.streak.last_completed, Some(today()));
}

#[test]
fn remove_missing_date_reports_no_change() {
    let mut habit = Habit::new(Uuid::new_v4(), "journal");
    habit.apply_completion_change(
        CompletionChange::Upsert(CompletionRecord::new(today(), 1.0)),
        today(),
    );

    assert!(!habit.apply_completion_change(CompletionChange::Remove(days_ago(3)), today()));
    assert_eq!(habit.completions.len(), 1);
    assert!(habit.apply_completion_change(CompletionChange::Remove(today()), today()));
    assert!(habit.completions.is_empty());
    assert_eq!(habit.streak, Default::default());
}

#[test]
fn removing_middle_completion_splits_streak() {
    let mut habit = Habit::new(Uuid::new_v4(), "walk");
    for offset in (0..=4).rev() {
        habit.apply_completion_change(
            CompletionChange::Upsert(CompletionRecord::new(days_ago(offset), 1.0)),
            today(),
        );
    }
    assert_eq!((habit.streak.current, habit.streak.longest), (5, 5));

    habit.apply_completion_change(CompletionChange::Remove(days_ago(2)), today());
    assert_eq!((habit.streak.current, habit.streak.longest), (2, 2));
    assert_eq!(habit.streak.last_completed, Some(today()));
}

#[test]
fn update_applies_only_set_fields() {
    let mut habit = Habit::new(Uuid::new_v4(), "stretch");
    habit.description = Some("morning".to_string());

    HabitUpdate {
        title: Some(" evening stretch ".to_string()),
        frequency: Some(HabitFrequency::Weekly),
        ..HabitUpdate::default()
    }
    .apply_to(&mut habit);

    assert_eq!(habit.title, "evening stretch");
    assert_eq!(habit.frequency, HabitFrequency::Weekly);
    assert_eq!(habit.description.as_deref(), Some("morning"));

    HabitUpdate {
        description: Some(None),
        ..HabitUpdate::default()
    }
    .apply_to(&mut habit);
    assert_eq!(habit.description, None);
}

#[test]
fn habit_serialization_uses_expected_wire_fields() {
    let mut habit = Habit::new(Uuid::new_v4(), "guitar");
    habit.category = HabitCategory::Learning;
    habit.apply_completion_change(
        CompletionChange::Upsert(CompletionRecord::new(today(), 1.0)),
        today(),
    );

    let json = serde_json::to_value(&habit).unwrap();
    assert_eq!(json["category"], "learning");
    assert_eq!(json["frequency"], "daily");
    assert_eq!(json["streak"]["current"], 1);
    assert_eq!(json["streak"]["last_completed"], "2026-05-20");
    assert_eq!(json["completions"][0]["date"], "2026-05-20");

    let decoded: Habit = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, habit);
}

#[test]
fn category_and_frequency_parse_storage_ids() {
    assert_eq!(HabitCategory::parse("Health"), Some(HabitCategory::Health));
    assert_eq!(HabitCategory::parse("hobby"), None);
    assert_eq!(HabitFrequency::parse(" MONTHLY "), Some(HabitFrequency::Monthly));
    for category in [HabitCategory::Social, HabitCategory::Other] {
        assert_eq!(HabitCategory::parse(category.as_str()), Some(category));
    }
}
