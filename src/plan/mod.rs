//! Workout plans - weeks of day-keyed workouts with planned exercises

pub mod edit;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::NotStarted => "not_started",
            PlanStatus::InProgress => "in_progress",
            PlanStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(PlanStatus::NotStarted),
            "in_progress" => Some(PlanStatus::InProgress),
            "completed" => Some(PlanStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn label(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lb),
            other => anyhow::bail!("unknown weight unit: {}", other),
        }
    }
}

/// Planned exercise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: Option<i64>,
    pub name: String,
    pub sets: i32,
    pub repetitions: i32,
    pub weight: f64,
    pub unit: WeightUnit,
    pub rest_secs: i32,
    /// Created in this edit session and not saved yet
    #[serde(default)]
    pub added_in_current_session: bool,
}

impl Exercise {
    pub fn new(name: &str, sets: i32, repetitions: i32, weight: f64, unit: WeightUnit) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            sets,
            repetitions,
            weight,
            unit,
            rest_secs: 90,
            added_in_current_session: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub day: Weekday,
    pub exercises: Vec<Exercise>,
}

impl Workout {
    pub fn new(day: Weekday) -> Self {
        Self {
            day,
            exercises: Vec::new(),
        }
    }
}

/// Position of a day in the Monday-first week
pub fn day_order(day: Weekday) -> u32 {
    day.num_days_from_monday()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Week {
    /// 1-based plan week this entry starts at
    pub position: i32,
    /// Extra times the week is repeated after `position`
    pub repeat: i32,
    pub workouts: Vec<Workout>,
}

impl Week {
    /// Last plan week covered by this entry
    pub fn last_position(&self) -> i32 {
        self.position + self.repeat
    }

    pub fn workout(&self, day: Weekday) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.day == day)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub id: Option<i64>,
    pub name: String,
    pub status: PlanStatus,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub weeks: Vec<Week>,
}

impl WorkoutPlan {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Number of plan weeks, counting repeats
    pub fn total_length(&self) -> i32 {
        self.weeks.last().map(Week::last_position).unwrap_or(0)
    }

    pub fn week(&self, position: i32) -> Option<&Week> {
        self.weeks.iter().find(|w| w.position == position)
    }

    pub fn workout(&self, week_position: i32, day: Weekday) -> Option<&Workout> {
        self.week(week_position)?.workout(day)
    }

    /// Week entry whose repeat range contains plan week `n` (1-based)
    pub fn week_covering(&self, n: i32) -> Option<&Week> {
        self.weeks
            .iter()
            .find(|w| w.position <= n && n <= w.last_position())
    }

    /// Workout scheduled on `date`, counted from the plan start
    pub fn workout_on(&self, date: NaiveDate) -> Option<(&Week, &Workout)> {
        let start = self.start?;
        let days = (date - start).num_days();
        if days < 0 {
            return None;
        }
        let n = i32::try_from(days / 7).ok()? + 1;
        let week = self.week_covering(n)?;
        let workout = week.workout(date.weekday())?;
        Some((week, workout))
    }

    /// Every exercise that was added and not saved yet
    pub fn unsaved_exercises(&self) -> usize {
        self.exercises().filter(|e| e.added_in_current_session).count()
    }

    /// Give new exercises ids and clear their unsaved flag
    pub fn mark_saved(&mut self) {
        let mut next_id = self.exercises().filter_map(|e| e.id).max().unwrap_or(0) + 1;

        for exercise in self
            .weeks
            .iter_mut()
            .flat_map(|w| w.workouts.iter_mut())
            .flat_map(|w| w.exercises.iter_mut())
        {
            if exercise.id.is_none() {
                exercise.id = Some(next_id);
                next_id += 1;
            }
            exercise.added_in_current_session = false;
        }
    }

    fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.weeks
            .iter()
            .flat_map(|w| w.workouts.iter())
            .flat_map(|w| w.exercises.iter())
    }
}
