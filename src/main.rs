//! liftplan - Workout plans, live set logging and swipeable plan lists

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use chrono::{Local, Weekday};
use clap::{Parser, Subcommand};
use tracing::warn;

use liftplan::db::Database;
use liftplan::plan::{Exercise, WeightUnit, WorkoutPlan};
use liftplan::session::{LoggingSession, SetInput};
use liftplan::tui::App;

const DEFAULT_DB: &str = "liftplan.db";

#[derive(Parser)]
#[command(name = "liftplan")]
#[command(author, version, about = "Workout planner and set logger")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "LIFTPLAN_DB", default_value = DEFAULT_DB)]
    db: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a plan's weeks in the terminal UI
    Tui {
        /// Plan id
        plan: i64,
    },

    /// Create and edit plans
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Log a workout set by set
    Log {
        /// Plan id (defaults to the plan in progress)
        plan: Option<i64>,

        /// Week position (defaults to today's week)
        #[arg(short, long, requires = "day")]
        week: Option<i32>,

        /// Day of the workout, e.g. "mon"
        #[arg(short, long, requires = "week")]
        day: Option<Weekday>,
    },

    /// Show logged workouts of a plan
    History {
        plan: i64,

        /// Number of workouts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Start Telegram bot
    Bot {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Create an empty plan
    New { name: String },
    List,
    Show { id: i64 },
    Delete { id: i64 },
    /// Start following a plan from today
    Start { id: i64 },
    Complete { id: i64 },
    AddWeek { id: i64 },
    DeleteWeek { id: i64, week: i32 },
    /// Set how many extra times a week repeats
    Repeat {
        id: i64,
        week: i32,
        #[arg(allow_negative_numbers = true)]
        repeat: i32,
    },
    AddWorkout { id: i64, week: i32, day: Weekday },
    DeleteWorkout { id: i64, week: i32, day: Weekday },
    AddExercise {
        id: i64,
        week: i32,
        day: Weekday,
        name: String,
        #[arg(short, long, default_value = "3")]
        sets: i32,
        #[arg(short, long, default_value = "10")]
        reps: i32,
        #[arg(short, long, default_value = "0", value_parser = parse_weight)]
        weight: f64,
        #[arg(short, long, default_value = "kg")]
        unit: WeightUnit,
        /// Rest between sets in seconds
        #[arg(long, default_value = "90")]
        rest: i32,
    },
    /// Remove an exercise by its 0-based index in the workout
    DeleteExercise { id: i64, week: i32, day: Weekday, index: usize },
}

/// Weights are stored as JSON numbers, so only finite, non-negative values
fn parse_weight(s: &str) -> Result<f64, String> {
    let weight: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(format!("weight must be a finite, non-negative number, got '{s}'"));
    }
    Ok(weight)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Tui { plan }) => {
            let db = Database::open(&cli.db)?;
            let mut app = App::new(db, plan)?;
            app.run()?;
        }

        Some(Commands::Plan { action }) => {
            let db = Database::open(&cli.db)?;
            run_plan_action(&db, action)?;
        }

        Some(Commands::Log { plan, week, day }) => {
            let db = Database::open(&cli.db)?;
            log_workout(&db, plan, week.zip(day))?;
        }

        Some(Commands::History { plan, limit }) => {
            let db = Database::open(&cli.db)?;
            let logs = db.get_logs(plan)?;
            println!("Workout history:");
            println!("{:-<60}", "");
            for log in logs.iter().take(limit) {
                println!(
                    "{} | week {:3} {} | {} sets | volume {:.0}",
                    log.date,
                    log.week,
                    log.day,
                    log.set_count(),
                    log.total_volume()
                );
                for entry in &log.exercises {
                    let sets: Vec<String> = entry
                        .sets
                        .iter()
                        .map(|s| format!("{}x{}{}", s.repetitions, s.weight, s.unit.label()))
                        .collect();
                    println!("    {:20} {}", entry.name, sets.join(", "));
                }
            }
        }

        Some(Commands::Bot { token }) => {
            println!("Starting Telegram bot...");
            println!("Database: {}", cli.db);
            liftplan::bot::run_bot(token, &cli.db).await?;
        }

        None => {
            let db = Database::open(&cli.db)?;
            run_plan_action(&db, PlanAction::List)?;
        }
    }

    Ok(())
}

fn run_plan_action(db: &Database, action: PlanAction) -> Result<()> {
    let today = Local::now().date_naive();

    match action {
        PlanAction::New { name } => {
            let mut plan = WorkoutPlan::new(&name);
            let id = db.create_plan(&mut plan)?;
            println!("Created plan '{}' (id: {})", name, id);
        }
        PlanAction::List => {
            let plans = db.list_plans()?;
            println!("Plans:");
            println!("{:-<60}", "");
            for p in plans {
                println!(
                    "{:4} | {:24} | {:3} weeks | {:11} | {}",
                    p.id,
                    p.name,
                    p.weeks,
                    p.status.as_str(),
                    p.start.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
                );
            }
        }
        PlanAction::Show { id } => print_plan(&db.require_plan(id)?),
        PlanAction::Delete { id } => {
            db.delete_plan(id)?;
            println!("Deleted plan {}", id);
        }
        PlanAction::Start { id } => {
            let plan = db.start_plan(id, today)?;
            println!("Started '{}' on {}", plan.name, today);
        }
        PlanAction::Complete { id } => {
            let plan = db.complete_plan(id, today)?;
            println!("Completed '{}' on {}", plan.name, today);
        }
        PlanAction::AddWeek { id } => edit_plan(db, id, |p| p.add_week())?,
        PlanAction::DeleteWeek { id, week } => edit_plan(db, id, |p| p.delete_week(week))?,
        PlanAction::Repeat { id, week, repeat } => {
            edit_plan(db, id, |p| p.change_week_repeat(week, repeat))?
        }
        PlanAction::AddWorkout { id, week, day } => edit_plan(db, id, |p| p.add_workout(week, day))?,
        PlanAction::DeleteWorkout { id, week, day } => {
            edit_plan(db, id, |p| p.delete_workout(week, day))?
        }
        PlanAction::AddExercise { id, week, day, name, sets, reps, weight, unit, rest } => {
            let mut exercise = Exercise::new(&name, sets, reps, weight, unit);
            exercise.rest_secs = rest;
            edit_plan(db, id, |p| p.add_exercise(week, day, exercise))?
        }
        PlanAction::DeleteExercise { id, week, day, index } => {
            edit_plan(db, id, |p| p.delete_exercise(week, day, index))?
        }
    }
    Ok(())
}

/// Load, edit and save a plan; report edits that changed nothing
fn edit_plan(db: &Database, id: i64, edit: impl FnOnce(&mut WorkoutPlan) -> bool) -> Result<()> {
    let mut plan = db.require_plan(id)?;
    if !edit(&mut plan) {
        warn!(id, "plan edit did not apply");
        println!("Nothing changed (no such week, day or exercise?)");
        return Ok(());
    }
    db.update_plan(&mut plan)?;
    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &WorkoutPlan) {
    println!(
        "{} [{}] - {} weeks",
        plan.name,
        plan.status.as_str(),
        plan.total_length()
    );
    println!("{:-<60}", "");
    for week in &plan.weeks {
        if week.repeat > 0 {
            println!("Week {}-{}", week.position, week.last_position());
        } else {
            println!("Week {}", week.position);
        }
        for workout in &week.workouts {
            println!("  {}", workout.day);
            for (i, e) in workout.exercises.iter().enumerate() {
                println!(
                    "    {}. {:20} {}x{} @ {} {} (rest {}s)",
                    i,
                    e.name,
                    e.sets,
                    e.repetitions,
                    e.weight,
                    e.unit.label(),
                    e.rest_secs
                );
            }
        }
    }
}

/// Interactive session on stdin. A trailing `@path` attaches a form-check video.
fn log_workout(db: &Database, plan_id: Option<i64>, slot: Option<(i32, Weekday)>) -> Result<()> {
    let plan = match plan_id {
        Some(id) => db.require_plan(id)?,
        None => db.active_plan()?.context("no plan in progress, pass a plan id")?,
    };
    let today = Local::now().date_naive();

    let (week, workout) = match slot {
        Some((week, day)) => (
            week,
            plan.workout(week, day)
                .with_context(|| format!("no {} workout in week {}", day, week))?,
        ),
        None => {
            let (week, workout) = plan
                .workout_on(today)
                .context("no workout planned for today")?;
            (week.position, workout)
        }
    };
    let mut session = LoggingSession::new(plan.id, week, workout.clone(), today);
    if session.is_finished() {
        bail!("workout has no exercises");
    }

    println!("Enter: reps [weight] [kg|lb] [@video], or empty line for the plan");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while let Some(prompt) = session.prompt() {
        print!("{} > ", prompt);
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            println!();
            bail!("input closed before the workout was finished");
        };
        let (text, video) = match line.split_once('@') {
            Some((text, video)) => (text, Some(video.trim().to_string())),
            None => (line.as_str(), None),
        };
        let Some(mut input) = SetInput::parse(text) else {
            println!("Could not read that set, try again");
            continue;
        };
        input.video = video.filter(|v| !v.is_empty());
        session.record(input);
    }

    for video in session.take_pending_videos() {
        println!("Form-check video queued: {}", video);
    }
    let mut log = session.into_log();
    let id = db.save_log(&mut log)?;
    println!(
        "Logged {} sets, volume {:.0} (id: {})",
        log.set_count(),
        log.total_volume(),
        id
    );
    Ok(())
}
