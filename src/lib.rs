//! liftplan - Workout plans, live set logging and swipeable plan lists

pub mod bot;
pub mod db;
pub mod plan;
pub mod session;
pub mod swipe;
pub mod tui;

pub use db::Database;
pub use plan::WorkoutPlan;
pub use session::LoggingSession;
