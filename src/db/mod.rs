//! Database module - SQLite storage for plans and workout logs

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use crate::plan::{PlanStatus, WorkoutPlan};
use crate::session::WorkoutLog;

/// Short plan listing
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub id: i64,
    pub name: String,
    pub status: PlanStatus,
    pub start: Option<NaiveDate>,
    pub weeks: i32,
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                start_date TEXT,
                end_date TEXT,
                weeks TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workout_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plan_id INTEGER REFERENCES plans(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                week INTEGER NOT NULL,
                day TEXT NOT NULL,
                exercises TEXT NOT NULL
            );
            PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }

    /// Insert a new plan, returning its id. Clears the unsaved markers.
    pub fn create_plan(&self, plan: &mut WorkoutPlan) -> Result<i64> {
        if plan.id.is_some() {
            bail!("plan '{}' is already stored", plan.name);
        }
        // The plan keeps its unsaved markers until the row is written
        let mut saved = plan.clone();
        saved.mark_saved();
        self.conn.execute(
            "INSERT INTO plans (name, status, start_date, end_date, weeks) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                saved.name,
                saved.status.as_str(),
                saved.start.map(|d| d.to_string()),
                saved.end.map(|d| d.to_string()),
                serde_json::to_string(&saved.weeks)?,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        saved.id = Some(id);
        *plan = saved;
        info!(id, name = %plan.name, "plan created");
        Ok(id)
    }

    /// Store the whole plan tree. Clears the unsaved markers.
    pub fn update_plan(&self, plan: &mut WorkoutPlan) -> Result<()> {
        let Some(id) = plan.id else {
            bail!("plan '{}' has not been created yet", plan.name);
        };
        let mut saved = plan.clone();
        saved.mark_saved();
        let changed = self.conn.execute(
            "UPDATE plans SET name = ?1, status = ?2, start_date = ?3, end_date = ?4, weeks = ?5 WHERE id = ?6",
            params![
                saved.name,
                saved.status.as_str(),
                saved.start.map(|d| d.to_string()),
                saved.end.map(|d| d.to_string()),
                serde_json::to_string(&saved.weeks)?,
                id,
            ],
        )?;
        if changed == 0 {
            bail!("plan {} not found", id);
        }
        *plan = saved;
        info!(id, weeks = plan.weeks.len(), "plan updated");
        Ok(())
    }

    pub fn delete_plan(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM plans WHERE id = ?1", params![id])?;
        if changed == 0 {
            bail!("plan {} not found", id);
        }
        info!(id, "plan deleted");
        Ok(())
    }

    pub fn get_plan(&self, id: i64) -> Result<Option<WorkoutPlan>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, status, start_date, end_date, weeks FROM plans WHERE id = ?1",
        )?;
        let raw = stmt.query_row(params![id], RawPlan::from_row).optional()?;
        raw.map(RawPlan::into_plan).transpose()
    }

    /// Plan by id, or an error naming the missing id
    pub fn require_plan(&self, id: i64) -> Result<WorkoutPlan> {
        self.get_plan(id)?
            .with_context(|| format!("plan {} not found", id))
    }

    pub fn list_plans(&self) -> Result<Vec<PlanSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, status, start_date, end_date, weeks FROM plans ORDER BY id",
        )?;
        let raws = stmt
            .query_map([], RawPlan::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter()
            .map(|raw| -> Result<PlanSummary> {
                let plan = raw.into_plan()?;
                Ok(PlanSummary {
                    id: plan.id.unwrap_or_default(),
                    name: plan.name.clone(),
                    status: plan.status,
                    start: plan.start,
                    weeks: plan.total_length(),
                })
            })
            .collect()
    }

    /// The plan currently being followed, if any
    pub fn active_plan(&self) -> Result<Option<WorkoutPlan>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM plans WHERE status = ?1 ORDER BY id LIMIT 1",
                params![PlanStatus::InProgress.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(id) => self.get_plan(id),
            None => Ok(None),
        }
    }

    /// Start following a plan. Only one plan may be in progress.
    pub fn start_plan(&self, id: i64, today: NaiveDate) -> Result<WorkoutPlan> {
        let mut plan = self.require_plan(id)?;
        if let Some(active) = self.active_plan()?
            && active.id != Some(id)
        {
            bail!("plan '{}' is already in progress", active.name);
        }
        if plan.status == PlanStatus::Completed {
            bail!("plan '{}' is already completed", plan.name);
        }
        plan.status = PlanStatus::InProgress;
        plan.start.get_or_insert(today);
        self.update_plan(&mut plan)?;
        Ok(plan)
    }

    pub fn complete_plan(&self, id: i64, today: NaiveDate) -> Result<WorkoutPlan> {
        let mut plan = self.require_plan(id)?;
        if plan.status != PlanStatus::InProgress {
            bail!("plan '{}' is not in progress", plan.name);
        }
        plan.status = PlanStatus::Completed;
        plan.end = Some(today);
        self.update_plan(&mut plan)?;
        Ok(plan)
    }

    pub fn save_log(&self, log: &mut WorkoutLog) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO workout_logs (plan_id, date, week, day, exercises) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                log.plan_id,
                log.date.to_string(),
                log.week,
                serde_json::to_string(&log.day)?,
                serde_json::to_string(&log.exercises)?,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        log.id = Some(id);
        info!(id, sets = log.set_count(), "workout log saved");
        Ok(id)
    }

    /// Logs of a plan, newest first
    pub fn get_logs(&self, plan_id: i64) -> Result<Vec<WorkoutLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, plan_id, date, week, day, exercises FROM workout_logs WHERE plan_id = ?1 ORDER BY date DESC, id DESC",
        )?;
        let raws = stmt
            .query_map(params![plan_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter()
            .map(|(id, plan_id, date, week, day, exercises)| -> Result<WorkoutLog> {
                Ok(WorkoutLog {
                    id: Some(id),
                    plan_id,
                    week,
                    day: serde_json::from_str(&day)?,
                    date: date.parse::<NaiveDate>()?,
                    exercises: serde_json::from_str(&exercises)?,
                })
            })
            .collect()
    }
}

/// Plan row before its text columns are decoded
struct RawPlan {
    id: i64,
    name: String,
    status: String,
    start: Option<String>,
    end: Option<String>,
    weeks: String,
}

impl RawPlan {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            start: row.get(3)?,
            end: row.get(4)?,
            weeks: row.get(5)?,
        })
    }

    fn into_plan(self) -> Result<WorkoutPlan> {
        let status = PlanStatus::parse(&self.status)
            .with_context(|| format!("bad status '{}' for plan {}", self.status, self.id))?;
        Ok(WorkoutPlan {
            id: Some(self.id),
            name: self.name,
            status,
            start: self.start.map(|d| d.parse::<NaiveDate>()).transpose()?,
            end: self.end.map(|d| d.parse::<NaiveDate>()).transpose()?,
            weeks: serde_json::from_str(&self.weeks)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Exercise, WeightUnit};
    use crate::session::LoggedSet;
    use chrono::Weekday;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn stored_plan(db: &Database, name: &str) -> WorkoutPlan {
        let mut plan = WorkoutPlan::new(name);
        plan.add_week();
        plan.add_workout(1, Weekday::Mon);
        plan.add_exercise(1, Weekday::Mon, Exercise::new("squat", 3, 5, 100.0, WeightUnit::Kg));
        db.create_plan(&mut plan).unwrap();
        plan
    }

    #[test]
    fn test_create_and_get_plan() {
        let db = Database::open(":memory:").unwrap();
        let plan = stored_plan(&db, "Strength");

        assert!(plan.id.is_some());
        assert_eq!(plan.unsaved_exercises(), 0);

        let loaded = db.get_plan(plan.id.unwrap()).unwrap().unwrap();
        assert_eq!(loaded, plan);
    }

    #[test]
    fn test_get_missing_plan() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.get_plan(42).unwrap().is_none());
        assert!(db.require_plan(42).is_err());
    }

    #[test]
    fn test_create_twice_fails() {
        let db = Database::open(":memory:").unwrap();
        let mut plan = stored_plan(&db, "Strength");
        assert!(db.create_plan(&mut plan).is_err());
    }

    #[test]
    fn test_update_plan() {
        let db = Database::open(":memory:").unwrap();
        let mut plan = stored_plan(&db, "Strength");
        plan.add_week();
        plan.change_week_repeat(2, 3);
        db.update_plan(&mut plan).unwrap();

        let loaded = db.require_plan(plan.id.unwrap()).unwrap();
        assert_eq!(loaded.total_length(), 5);
    }

    #[test]
    fn test_failed_update_keeps_unsaved_exercises() {
        let db = Database::open(":memory:").unwrap();
        let mut plan = stored_plan(&db, "Strength");
        db.delete_plan(plan.id.unwrap()).unwrap();

        plan.add_exercise(1, Weekday::Mon, Exercise::new("press", 3, 8, 40.0, WeightUnit::Kg));
        let before = plan.clone();
        assert!(db.update_plan(&mut plan).is_err());

        assert_eq!(plan, before);
        assert_eq!(plan.unsaved_exercises(), 1);
        assert_eq!(plan.workout(1, Weekday::Mon).unwrap().exercises[1].id, None);
    }

    #[test]
    fn test_update_unsaved_plan_fails() {
        let db = Database::open(":memory:").unwrap();
        let mut plan = WorkoutPlan::new("draft");
        assert!(db.update_plan(&mut plan).is_err());
    }

    #[test]
    fn test_delete_plan() {
        let db = Database::open(":memory:").unwrap();
        let plan = stored_plan(&db, "Strength");
        db.delete_plan(plan.id.unwrap()).unwrap();
        assert!(db.list_plans().unwrap().is_empty());
        assert!(db.delete_plan(plan.id.unwrap()).is_err());
    }

    #[test]
    fn test_list_plans() {
        let db = Database::open(":memory:").unwrap();
        stored_plan(&db, "A");
        stored_plan(&db, "B");
        let plans = db.list_plans().unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[1].name, "B");
        assert_eq!(plans[0].weeks, 1);
        assert_eq!(plans[0].status, PlanStatus::NotStarted);
    }

    #[test]
    fn test_only_one_plan_in_progress() {
        let db = Database::open(":memory:").unwrap();
        let a = stored_plan(&db, "A");
        let b = stored_plan(&db, "B");

        let started = db.start_plan(a.id.unwrap(), date(2)).unwrap();
        assert_eq!(started.status, PlanStatus::InProgress);
        assert_eq!(started.start, Some(date(2)));
        assert!(db.start_plan(b.id.unwrap(), date(2)).is_err());

        let done = db.complete_plan(a.id.unwrap(), date(30)).unwrap();
        assert_eq!(done.end, Some(date(30)));
        assert!(db.active_plan().unwrap().is_none());

        db.start_plan(b.id.unwrap(), date(31)).unwrap();
        assert_eq!(db.active_plan().unwrap().unwrap().name, "B");
        assert!(db.start_plan(a.id.unwrap(), date(31)).is_err());
    }

    #[test]
    fn test_complete_requires_in_progress() {
        let db = Database::open(":memory:").unwrap();
        let plan = stored_plan(&db, "A");
        assert!(db.complete_plan(plan.id.unwrap(), date(2)).is_err());
    }

    #[test]
    fn test_save_and_get_logs() {
        let db = Database::open(":memory:").unwrap();
        let plan = stored_plan(&db, "A");
        let plan_id = plan.id.unwrap();

        for d in [2, 9] {
            let mut log = WorkoutLog::new(Some(plan_id), 1, Weekday::Mon, date(d));
            log.append(Some(1), "squat", LoggedSet {
                weight: 100.0,
                repetitions: 5,
                unit: WeightUnit::Kg,
                rest_secs: 90,
                video: Some("clip.mp4".to_string()),
            });
            db.save_log(&mut log).unwrap();
            assert!(log.id.is_some());
        }

        let logs = db.get_logs(plan_id).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].date, date(9));
        assert_eq!(logs[0].day, Weekday::Mon);
        assert_eq!(logs[1].exercises[0].sets[0].video.as_deref(), Some("clip.mp4"));
    }
}
