//! Structural edits of a plan being worked on
//!
//! Week positions stay contiguous: every edit that changes how many plan
//! weeks an entry spans shifts all later entries by the same amount.
//! Edits that name a missing week, day or exercise change nothing and
//! return `false`, as do edits whose week positions would overflow `i32`
//! and exercises with a non-finite weight.

use chrono::Weekday;
use tracing::debug;

use super::{Exercise, Week, Workout, WorkoutPlan, day_order};

impl WorkoutPlan {
    /// Append an empty week after the last covered plan week
    pub fn add_week(&mut self) -> bool {
        let Some(position) = self.total_length().checked_add(1) else {
            return false;
        };
        self.weeks.push(Week {
            position,
            repeat: 0,
            workouts: Vec::new(),
        });
        debug!(position, "week added");
        true
    }

    pub fn delete_week(&mut self, position: i32) -> bool {
        let Some(index) = self.week_index(position) else {
            return false;
        };
        let removed = self.weeks.remove(index);
        self.shift_weeks_from(index, -(1 + removed.repeat));
        debug!(position, repeat = removed.repeat, "week deleted");
        true
    }

    /// Set how many extra times a week repeats. Negative counts are rejected.
    pub fn change_week_repeat(&mut self, position: i32, new_repeat: i32) -> bool {
        if new_repeat < 0 {
            return false;
        }
        let Some(index) = self.week_index(position) else {
            return false;
        };
        let delta = new_repeat - self.weeks[index].repeat;
        // Later weeks end at total_length, so checking it covers every shift
        if self.weeks[index].position.checked_add(new_repeat).is_none()
            || self.total_length().checked_add(delta).is_none()
        {
            debug!(position, new_repeat, "repeat rejected, week positions would overflow");
            return false;
        }
        self.shift_weeks_from(index + 1, delta);
        self.weeks[index].repeat = new_repeat;
        true
    }

    /// Add an empty workout on `day`. A day that already has one is rejected.
    pub fn add_workout(&mut self, week_position: i32, day: Weekday) -> bool {
        let Some(week) = self.week_mut(week_position) else {
            return false;
        };
        if week.workout(day).is_some() {
            return false;
        }
        week.workouts.push(Workout::new(day));
        week.workouts.sort_by_key(|w| day_order(w.day));
        true
    }

    pub fn delete_workout(&mut self, week_position: i32, day: Weekday) -> bool {
        let Some(week) = self.week_mut(week_position) else {
            return false;
        };
        let before = week.workouts.len();
        week.workouts.retain(|w| w.day != day);
        week.workouts.len() != before
    }

    /// Append an exercise; it is flagged unsaved until the plan is saved
    pub fn add_exercise(&mut self, week_position: i32, day: Weekday, mut exercise: Exercise) -> bool {
        if !exercise.weight.is_finite() {
            return false;
        }
        let Some(workout) = self.workout_mut(week_position, day) else {
            return false;
        };
        exercise.added_in_current_session = true;
        workout.exercises.push(exercise);
        true
    }

    /// Replace the exercise at `index`. An unsaved exercise stays unsaved.
    pub fn update_exercise(
        &mut self,
        week_position: i32,
        day: Weekday,
        index: usize,
        mut exercise: Exercise,
    ) -> bool {
        if !exercise.weight.is_finite() {
            return false;
        }
        let Some(slot) = self
            .workout_mut(week_position, day)
            .and_then(|w| w.exercises.get_mut(index))
        else {
            return false;
        };
        exercise.added_in_current_session |= slot.added_in_current_session;
        *slot = exercise;
        true
    }

    pub fn delete_exercise(&mut self, week_position: i32, day: Weekday, index: usize) -> bool {
        let Some(workout) = self.workout_mut(week_position, day) else {
            return false;
        };
        if index >= workout.exercises.len() {
            return false;
        }
        workout.exercises.remove(index);
        true
    }

    fn week_index(&self, position: i32) -> Option<usize> {
        self.weeks.iter().position(|w| w.position == position)
    }

    fn week_mut(&mut self, position: i32) -> Option<&mut Week> {
        self.weeks.iter_mut().find(|w| w.position == position)
    }

    fn workout_mut(&mut self, week_position: i32, day: Weekday) -> Option<&mut Workout> {
        self.week_mut(week_position)?
            .workouts
            .iter_mut()
            .find(|w| w.day == day)
    }

    fn shift_weeks_from(&mut self, index: usize, delta: i32) {
        for week in self.weeks.iter_mut().skip(index) {
            week.position += delta;
        }
    }
}
