//! Exercise/set position during a live session

use serde::{Deserialize, Serialize};

use crate::plan::{WeightUnit, Workout};

/// Planned values used to pre-fill the next set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedSet {
    pub repetitions: i32,
    pub weight: f64,
    pub unit: WeightUnit,
    pub rest_secs: i32,
}

/// Points at the set being performed. Only moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCursor {
    pub exercise_index: usize,
    pub set_index: usize,
    pub finished: bool,
}

impl SessionCursor {
    /// Cursor at the first set; already finished if there is nothing to log
    pub fn start(workout: &Workout) -> Self {
        Self {
            finished: workout.exercises.is_empty(),
            ..Default::default()
        }
    }

    /// Move to the next planned set. No-op once finished.
    pub fn advance(&mut self, workout: &Workout) {
        if self.finished {
            return;
        }
        let Some(exercise) = workout.exercises.get(self.exercise_index) else {
            self.finished = true;
            return;
        };

        let last_set = exercise.sets.max(1) as usize - 1;
        if self.set_index < last_set {
            self.set_index += 1;
        } else if self.exercise_index + 1 < workout.exercises.len() {
            self.exercise_index += 1;
            self.set_index = 0;
        } else {
            self.finished = true;
        }
    }

    pub fn expected(&self, workout: &Workout) -> Option<ExpectedSet> {
        if self.finished {
            return None;
        }
        let exercise = workout.exercises.get(self.exercise_index)?;
        Some(ExpectedSet {
            repetitions: exercise.repetitions,
            weight: exercise.weight,
            unit: exercise.unit,
            rest_secs: exercise.rest_secs,
        })
    }
}
