//! Live workout logging
//!
//! A session walks the planned sets of one workout, pre-filling each from
//! the plan and appending what was actually done to a `WorkoutLog`.

pub mod cursor;
pub mod log;

pub use cursor::{ExpectedSet, SessionCursor};
pub use log::{ExerciseLogEntry, LoggedSet, WorkoutLog};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::plan::{Exercise, WeightUnit, Workout};

/// What the user entered for one set. Missing values take the plan's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetInput {
    pub repetitions: Option<i32>,
    pub weight: Option<f64>,
    pub unit: Option<WeightUnit>,
    pub video: Option<String>,
}

impl SetInput {
    /// Parse `"reps [weight] [unit]"`; `"+"` or an empty line accepts the plan
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || text == "+" {
            return Some(Self::default());
        }

        let mut parts = text.split_whitespace();
        let repetitions = parts.next()?.parse::<i32>().ok().filter(|r| *r >= 0)?;
        let weight = match parts.next() {
            Some(w) => Some(w.replace(',', ".").parse::<f64>().ok().filter(|w| w.is_finite() && *w >= 0.0)?),
            None => None,
        };
        let unit = match parts.next() {
            Some(u) => Some(u.parse::<WeightUnit>().ok()?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            repetitions: Some(repetitions),
            weight,
            unit,
            video: None,
        })
    }
}

/// One workout being performed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSession {
    workout: Workout,
    cursor: SessionCursor,
    log: WorkoutLog,
    /// Form-check videos waiting for upload, owned by this session only
    pending_videos: Vec<String>,
}

impl LoggingSession {
    pub fn new(plan_id: Option<i64>, week: i32, workout: Workout, date: NaiveDate) -> Self {
        let cursor = SessionCursor::start(&workout);
        let log = WorkoutLog::new(plan_id, week, workout.day, date);
        Self {
            workout,
            cursor,
            log,
            pending_videos: Vec::new(),
        }
    }

    pub fn cursor(&self) -> SessionCursor {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor.finished
    }

    pub fn log(&self) -> &WorkoutLog {
        &self.log
    }

    pub fn into_log(self) -> WorkoutLog {
        self.log
    }

    /// Planned exercises of the workout
    pub fn exercises(&self) -> &[Exercise] {
        &self.workout.exercises
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        if self.cursor.finished {
            return None;
        }
        self.workout.exercises.get(self.cursor.exercise_index)
    }

    pub fn expected(&self) -> Option<ExpectedSet> {
        self.cursor.expected(&self.workout)
    }

    /// Log the current set and move on. Returns false if already finished.
    pub fn record(&mut self, input: SetInput) -> bool {
        let (Some(exercise), Some(expected)) = (self.current_exercise(), self.expected()) else {
            return false;
        };
        let exercise_id = exercise.id;
        let name = exercise.name.clone();

        if let Some(video) = &input.video {
            self.pending_videos.push(video.clone());
        }
        let set = LoggedSet {
            weight: input.weight.unwrap_or(expected.weight),
            repetitions: input.repetitions.unwrap_or(expected.repetitions),
            unit: input.unit.unwrap_or(expected.unit),
            rest_secs: expected.rest_secs,
            video: input.video,
        };
        self.log.append(exercise_id, &name, set);
        self.cursor.advance(&self.workout);

        if self.cursor.finished {
            info!(
                sets = self.log.set_count(),
                volume = self.log.total_volume(),
                "workout session finished"
            );
        }
        true
    }

    /// Hand the queued videos to an uploader
    pub fn take_pending_videos(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_videos)
    }

    /// Human-readable prompt for the set at the cursor
    pub fn prompt(&self) -> Option<String> {
        let exercise = self.current_exercise()?;
        let expected = self.expected()?;
        Some(format!(
            "{} - set {}/{}: {} x {} {}",
            exercise.name,
            self.cursor.set_index + 1,
            exercise.sets.max(1),
            expected.repetitions,
            expected.weight,
            expected.unit.label()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn workout() -> Workout {
        let mut workout = Workout::new(Weekday::Mon);
        let mut squat = Exercise::new("squat", 2, 5, 100.0, WeightUnit::Kg);
        squat.id = Some(1);
        let mut bench = Exercise::new("bench", 1, 8, 80.0, WeightUnit::Kg);
        bench.id = Some(2);
        workout.exercises = vec![squat, bench];
        workout
    }

    fn session() -> LoggingSession {
        LoggingSession::new(
            Some(3),
            1,
            workout(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        )
    }

    #[test]
    fn test_parse_set_input() {
        assert_eq!(SetInput::parse("+"), Some(SetInput::default()));
        assert_eq!(SetInput::parse("  "), Some(SetInput::default()));

        let input = SetInput::parse("8 62,5 lb").unwrap();
        assert_eq!(input.repetitions, Some(8));
        assert_eq!(input.weight, Some(62.5));
        assert_eq!(input.unit, Some(WeightUnit::Lb));

        let input = SetInput::parse("12").unwrap();
        assert_eq!(input.repetitions, Some(12));
        assert_eq!(input.weight, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SetInput::parse("lots").is_none());
        assert!(SetInput::parse("-3").is_none());
        assert!(SetInput::parse("5 heavy").is_none());
        assert!(SetInput::parse("5 100 kg extra").is_none());
    }

    #[test]
    fn test_parse_rejects_non_finite_weight() {
        assert!(SetInput::parse("5 inf").is_none());
        assert!(SetInput::parse("5 NaN").is_none());
        assert!(SetInput::parse("5 infinity kg").is_none());
        assert!(SetInput::parse("5 1e400").is_none());
    }

    #[test]
    fn test_full_session() {
        let mut session = session();
        assert_eq!(session.prompt().unwrap(), "squat - set 1/2: 5 x 100 kg");

        assert!(session.record(SetInput::default()));
        assert!(session.record(SetInput::parse("4 100").unwrap()));
        assert_eq!(session.cursor().exercise_index, 1);
        assert!(session.record(SetInput::parse("8 82.5").unwrap()));

        assert!(session.is_finished());
        assert!(session.prompt().is_none());
        assert!(!session.record(SetInput::default()));

        let log = session.into_log();
        assert_eq!(log.plan_id, Some(3));
        assert_eq!(log.exercises.len(), 2);
        assert_eq!(log.exercises[0].sets[1].repetitions, 4);
        assert_eq!(log.exercises[1].sets[0].weight, 82.5);
        assert_eq!(log.exercises[1].exercise_id, Some(2));
    }

    #[test]
    fn test_videos_are_session_owned() {
        let mut session = session();
        let mut other = session.clone();

        session.record(SetInput {
            video: Some("clips/squat1.mp4".to_string()),
            ..Default::default()
        });
        assert_eq!(session.log().exercises[0].sets[0].video.as_deref(), Some("clips/squat1.mp4"));

        assert!(other.take_pending_videos().is_empty());
        assert_eq!(session.take_pending_videos(), vec!["clips/squat1.mp4".to_string()]);
        assert!(session.take_pending_videos().is_empty());
    }
}
