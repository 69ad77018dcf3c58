//! Workout module for structured training sessions.

pub mod engine;
pub mod library;
pub mod types;

pub use engine::WorkoutEngine;
pub use library::{builtin, load_workout, save_workout};
pub use types::{
    CoachingHint, Guidance, Workout, WorkoutError, WorkoutEvent, WorkoutInterval, WorkoutKind,
    WorkoutPhase, WorkoutRunState,
};
