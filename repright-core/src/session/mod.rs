//! Workout session state machine and workout history paging.
//!
//! `WorkoutSessionController` owns the one live session and is the only way to
//! mutate it. `HistoryBrowser` is read-only and shares the same API client.

mod controller;
mod history;
mod state;

pub use controller::WorkoutSessionController;
pub use history::{ExerciseReps, HistoryBrowser, HistoryDirection, WorkoutPage};
pub use state::{ExerciseResult, SessionState, WorkoutStatus};
