//! Command-line entry point over `streakline_core`.
//!
//! # Responsibility
//! - Compute streaks from a JSON completion file without any storage.
//! - Drive the habit service against a SQLite database file.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use streakline_core::db::open_db;
use streakline_core::{
    default_log_level, init_logging, parse_calendar_day, recompute_streak, today_local,
    CompleteHabit, CompletionRecord, HabitCategory, HabitFrequency, HabitListQuery, HabitService,
    NewHabit, SqliteHabitRepository, StatsRange,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "streakline", version, about = "Habit streak tracking")]
struct Cli {
    /// SQLite database file used by `habit` commands.
    #[arg(long, global = true, env = "STREAKLINE_DB")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, global = true, env = "STREAKLINE_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the core version.
    Ping,
    /// Compute a streak from a JSON array of completion records.
    Streak {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        target: f64,
        #[arg(long, value_parser = parse_day)]
        today: Option<NaiveDate>,
    },
    /// Manage stored habits.
    #[command(subcommand)]
    Habit(HabitCommand),
}

#[derive(Args)]
struct OwnerArg {
    #[arg(long)]
    owner: Uuid,
}

#[derive(Subcommand)]
enum HabitCommand {
    Create {
        #[command(flatten)]
        owner: OwnerArg,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_category)]
        category: Option<HabitCategory>,
        #[arg(long, value_parser = parse_frequency)]
        frequency: Option<HabitFrequency>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
    },
    List {
        #[command(flatten)]
        owner: OwnerArg,
        #[arg(long, value_parser = parse_category)]
        category: Option<HabitCategory>,
        #[arg(long, value_parser = parse_frequency)]
        frequency: Option<HabitFrequency>,
        #[arg(long)]
        active: Option<bool>,
    },
    Complete {
        #[command(flatten)]
        owner: OwnerArg,
        #[arg(long)]
        habit: Uuid,
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
        #[arg(long)]
        value: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    Uncomplete {
        #[command(flatten)]
        owner: OwnerArg,
        #[arg(long)]
        habit: Uuid,
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    Delete {
        #[command(flatten)]
        owner: OwnerArg,
        #[arg(long)]
        habit: Uuid,
    },
    Stats {
        #[command(flatten)]
        owner: OwnerArg,
        #[arg(long, value_parser = parse_day)]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = parse_day)]
        end: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    match cli.command {
        Command::Ping => {
            println!("streakline_core version={}", streakline_core::core_version());
            Ok(())
        }
        Command::Streak {
            input,
            target,
            today,
        } => run_streak(input, target, today.unwrap_or_else(today_local)),
        Command::Habit(command) => {
            let Some(db_path) = cli.db else {
                bail!("habit commands need --db <path> or STREAKLINE_DB");
            };
            run_habit(db_path, command)
        }
    }
}

fn run_streak(input: PathBuf, target: f64, today: NaiveDate) -> Result<()> {
    if !target.is_finite() || target <= 0.0 {
        bail!("--target must be a positive number, got {target}");
    }

    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read `{}`", input.display()))?;
    let records: Vec<CompletionRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("`{}` is not a JSON array of completions", input.display()))?;
    debug!("event=cli_streak module=cli records={}", records.len());

    let state = recompute_streak(&records, target, today);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn run_habit(db_path: PathBuf, command: HabitCommand) -> Result<()> {
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open database `{}`", db_path.display()))?;
    let service = HabitService::new(SqliteHabitRepository::try_new(&conn)?);
    let today = today_local();

    let output = match command {
        HabitCommand::Create {
            owner,
            title,
            description,
            category,
            frequency,
            target,
            unit,
        } => {
            let request = NewHabit {
                title,
                description,
                category,
                frequency,
                target_value: target,
                unit,
                ..NewHabit::default()
            };
            serde_json::to_string_pretty(&service.create_habit(owner.owner, request)?)?
        }
        HabitCommand::List {
            owner,
            category,
            frequency,
            active,
        } => {
            let query = HabitListQuery {
                category,
                frequency,
                is_active: active,
                ..HabitListQuery::for_owner(owner.owner)
            };
            serde_json::to_string_pretty(&service.list_habits(&query)?)?
        }
        HabitCommand::Complete {
            owner,
            habit,
            date,
            value,
            notes,
        } => {
            let request = CompleteHabit { date, value, notes };
            let updated = service.complete_habit(owner.owner, habit, request, today)?;
            serde_json::to_string_pretty(&updated.streak)?
        }
        HabitCommand::Uncomplete { owner, habit, date } => {
            let updated = service.uncomplete_habit(owner.owner, habit, date, today)?;
            serde_json::to_string_pretty(&updated.streak)?
        }
        HabitCommand::Delete { owner, habit } => {
            service.delete_habit(owner.owner, habit)?;
            format!("deleted {habit}")
        }
        HabitCommand::Stats { owner, start, end } => {
            let stats = service.habit_stats(owner.owner, &StatsRange { start, end }, today)?;
            serde_json::to_string_pretty(&stats)?
        }
    };

    println!("{output}");
    Ok(())
}

fn parse_day(value: &str) -> Result<NaiveDate, String> {
    parse_calendar_day(value).map_err(|err| err.to_string())
}

fn parse_category(value: &str) -> Result<HabitCategory, String> {
    HabitCategory::parse(value).ok_or_else(|| format!("unknown category `{value}`"))
}

fn parse_frequency(value: &str) -> Result<HabitFrequency, String> {
    HabitFrequency::parse(value).ok_or_else(|| format!("unknown frequency `{value}`"))
}
