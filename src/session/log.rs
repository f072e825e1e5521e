//! Record of the sets actually performed

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::plan::WeightUnit;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedSet {
    pub weight: f64,
    pub repetitions: i32,
    pub unit: WeightUnit,
    pub rest_secs: i32,
    /// Form-check video reference (path or remote file id)
    pub video: Option<String>,
}

/// Consecutive sets of one exercise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLogEntry {
    pub exercise_id: Option<i64>,
    pub name: String,
    pub sets: Vec<LoggedSet>,
}

impl ExerciseLogEntry {
    fn is_same_exercise(&self, exercise_id: Option<i64>, name: &str) -> bool {
        match exercise_id {
            Some(id) => self.exercise_id == Some(id),
            None => self.name == name,
        }
    }

    pub fn volume(&self) -> f64 {
        self.sets
            .iter()
            .map(|s| s.weight * s.repetitions as f64)
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    pub id: Option<i64>,
    pub plan_id: Option<i64>,
    pub week: i32,
    pub day: Weekday,
    pub date: NaiveDate,
    pub exercises: Vec<ExerciseLogEntry>,
}

impl WorkoutLog {
    pub fn new(plan_id: Option<i64>, week: i32, day: Weekday, date: NaiveDate) -> Self {
        Self {
            id: None,
            plan_id,
            week,
            day,
            date,
            exercises: Vec::new(),
        }
    }

    /// Add a set, continuing the last entry when it is the same exercise
    pub fn append(&mut self, exercise_id: Option<i64>, name: &str, set: LoggedSet) {
        if let Some(entry) = self.exercises.last_mut()
            && entry.is_same_exercise(exercise_id, name)
        {
            entry.sets.push(set);
            return;
        }
        self.exercises.push(ExerciseLogEntry {
            exercise_id,
            name: name.to_string(),
            sets: vec![set],
        });
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Sum of weight x reps. Mixed units are added as-is.
    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(ExerciseLogEntry::volume).sum()
    }
}
