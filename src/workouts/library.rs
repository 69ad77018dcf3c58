//! Built-in workout templates and workout files.
//!
//! Workouts are stored as JSON. Omitted warm-up and cool-down fall back to
//! five minutes each.

use super::types::{Workout, WorkoutError, WorkoutInterval, WorkoutKind};
use std::path::Path;

/// Names accepted by [`builtin`].
pub const BUILTIN_WORKOUTS: &[&str] = &["steady", "intervals", "tempo"];

/// A single block at constant power.
pub fn steady_state(duration_minutes: u32, power_watts: u16) -> Workout {
    Workout::new(
        format!("Steady State {}min", duration_minutes),
        WorkoutKind::SteadyState,
        vec![WorkoutInterval::new(duration_minutes * 60, power_watts)
            .with_description(format!("Steady state at {}W", power_watts))],
    )
    .with_description(format!(
        "Steady state ride at {}W for {} minutes",
        power_watts, duration_minutes
    ))
}

/// Repeated work intervals with rest between them (not after the last).
pub fn intervals(
    work_seconds: u32,
    rest_seconds: u32,
    work_watts: u16,
    repetitions: u32,
) -> Workout {
    let blocks = (0..repetitions)
        .map(|i| {
            let rest = if i + 1 < repetitions { rest_seconds } else { 0 };
            WorkoutInterval::new(work_seconds, work_watts)
                .with_rest(rest)
                .with_description(format!("Work interval {}/{}", i + 1, repetitions))
        })
        .collect();

    Workout::new(
        format!("Intervals {}x{}s", repetitions, work_seconds),
        WorkoutKind::Intervals,
        blocks,
    )
    .with_description(format!(
        "{} intervals of {}s work, {}s rest",
        repetitions, work_seconds, rest_seconds
    ))
}

/// Constant power at 90 rpm.
pub fn tempo(duration_minutes: u32, power_watts: u16) -> Workout {
    Workout::new(
        format!("Tempo {}min", duration_minutes),
        WorkoutKind::Tempo,
        vec![WorkoutInterval::new(duration_minutes * 60, power_watts)
            .with_cadence(90)
            .with_description(format!("Tempo at {}W, 90 RPM", power_watts))],
    )
    .with_description(format!(
        "Tempo ride at {}W for {} minutes",
        power_watts, duration_minutes
    ))
}

/// Built-in workout by name.
pub fn builtin(name: &str) -> Result<Workout, WorkoutError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "steady" => Ok(steady_state(20, 200)),
        "intervals" => Ok(intervals(60, 60, 300, 5)),
        "tempo" => Ok(tempo(30, 220)),
        _ => Err(WorkoutError::NotFound(name.to_string())),
    }
}

/// Load a workout from a JSON file.
pub fn load_workout(path: &Path) -> Result<Workout, WorkoutError> {
    let content = std::fs::read_to_string(path)?;
    let workout: Workout = serde_json::from_str(&content)?;
    workout.validate()?;
    tracing::debug!("Loaded workout '{}' from {}", workout.name, path.display());
    Ok(workout)
}

/// Save a workout as pretty-printed JSON.
pub fn save_workout(workout: &Workout, path: &Path) -> Result<(), WorkoutError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(workout)?;
    std::fs::write(path, content)?;
    Ok(())
}
