//! Unit tests for the WorkoutEngine state machine.

use spinlink::sensors::types::TelemetrySample;
use spinlink::workouts::engine::WorkoutEngine;
use spinlink::workouts::types::{
    CoachingHint, Workout, WorkoutError, WorkoutEvent, WorkoutInterval, WorkoutKind, WorkoutPhase,
};
use std::time::{Duration, Instant};

fn create_test_workout() -> Workout {
    Workout::new(
        "Engine Test",
        WorkoutKind::Intervals,
        vec![
            WorkoutInterval::new(60, 250).with_rest(30),
            WorkoutInterval::new(60, 300).with_cadence(95),
        ],
    )
    .with_warmup(120)
    .with_cooldown(60)
}

fn sample(start: Instant, millis: u64, power: i16) -> TelemetrySample {
    TelemetrySample::with_power(millis, start + Duration::from_millis(millis), power)
}

#[test]
fn test_engine_starts_idle() {
    let engine = WorkoutEngine::new();
    assert_eq!(engine.phase(), WorkoutPhase::Idle);
    assert!(!engine.is_active());
    assert!(engine.workout().is_none());
}

#[test]
fn test_update_without_workout_returns_none() {
    let mut engine = WorkoutEngine::new();
    assert!(engine.update(&sample(Instant::now(), 0, 200)).is_none());
}

#[test]
fn test_stop_when_idle_is_error() {
    let mut engine = WorkoutEngine::new();
    assert!(matches!(engine.stop(), Err(WorkoutError::NotRunning)));
}

#[test]
fn test_full_schedule() {
    let start = Instant::now();
    let mut engine = WorkoutEngine::new();
    engine.start_at(create_test_workout(), start).unwrap();

    // Warm-up 0-120s, interval 1 120-180s, rest 180-210s,
    // interval 2 210-270s, cool-down 270-330s
    let expectations = [
        (0, WorkoutPhase::Warmup),
        (119_999, WorkoutPhase::Warmup),
        (120_000, WorkoutPhase::Interval),
        (179_500, WorkoutPhase::Interval),
        (180_000, WorkoutPhase::Rest),
        (210_000, WorkoutPhase::Interval),
        (270_000, WorkoutPhase::Cooldown),
        (329_000, WorkoutPhase::Cooldown),
    ];

    for (millis, phase) in expectations {
        let guidance = engine.update(&sample(start, millis, 200)).unwrap();
        assert_eq!(guidance.phase, phase, "at {}ms", millis);
    }

    assert!(engine.update(&sample(start, 330_000, 200)).is_none());
    assert_eq!(engine.phase(), WorkoutPhase::Completed);
}

#[test]
fn test_interval_guidance_fields() {
    let start = Instant::now();
    let mut engine = WorkoutEngine::new();
    engine.start_at(create_test_workout(), start).unwrap();

    let guidance = engine.update(&sample(start, 225_000, 270)).unwrap();
    assert_eq!(guidance.phase, WorkoutPhase::Interval);
    assert_eq!(guidance.interval_index, Some(1));
    assert_eq!(guidance.target_power_watts, 300);
    assert_eq!(guidance.target_cadence_rpm, Some(95));
    assert_eq!(guidance.power_difference_watts, -30);
    assert_eq!(guidance.hint, Some(CoachingHint::Increase));
    assert!((guidance.elapsed_seconds - 15.0).abs() < 1e-3);
    assert!((guidance.remaining_seconds - 45.0).abs() < 1e-3);
    assert_eq!(guidance.description, "60s @ 300W");
}

#[test]
fn test_relative_targets() {
    let start = Instant::now();
    let mut engine = WorkoutEngine::new();
    engine.start_at(create_test_workout(), start).unwrap();

    let warmup = engine.update(&sample(start, 10_000, 200)).unwrap();
    assert_eq!(warmup.target_power_watts, 100);

    let rest = engine.update(&sample(start, 190_000, 200)).unwrap();
    assert_eq!(rest.phase, WorkoutPhase::Rest);
    assert_eq!(rest.target_power_watts, 60);

    let cooldown = engine.update(&sample(start, 280_000, 200)).unwrap();
    assert_eq!(cooldown.target_power_watts, 80);
}

#[test]
fn test_events_in_order() {
    let start = Instant::now();
    let mut engine = WorkoutEngine::new();
    let events = engine.subscribe();
    engine.start_at(create_test_workout(), start).unwrap();

    for secs in (0..=330).step_by(5) {
        engine.update(&sample(start, secs * 1000, 200));
    }

    let names: Vec<_> = events.try_iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec![
            "workout_started",
            "interval_started",
            "rest_started",
            "interval_started",
            "cooldown_started",
            "workout_completed",
        ]
    );
}

#[test]
fn test_stop_during_rest() {
    let start = Instant::now();
    let mut engine = WorkoutEngine::new();
    engine.start_at(create_test_workout(), start).unwrap();
    engine.update(&sample(start, 185_000, 150));
    assert_eq!(engine.phase(), WorkoutPhase::Rest);

    let events = engine.subscribe();
    engine.stop().unwrap();

    assert_eq!(engine.phase(), WorkoutPhase::Stopped);
    assert!(engine.update(&sample(start, 186_000, 150)).is_none());
    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![WorkoutEvent::WorkoutStopped {
            workout_name: "Engine Test".to_string(),
            phase: WorkoutPhase::Rest,
        }]
    );
}

#[test]
fn test_completed_workout_reports_total_time() {
    let start = Instant::now();
    let mut engine = WorkoutEngine::new();
    let events = engine.subscribe();
    let workout = Workout::new("Short", WorkoutKind::Custom, vec![WorkoutInterval::new(5, 100)])
        .with_warmup(0)
        .with_cooldown(0);
    engine.start_at(workout, start).unwrap();

    // Late sample: completion is stamped at the schedule boundary
    assert!(engine.update(&sample(start, 9_000, 100)).is_none());

    let completed = events
        .try_iter()
        .find(|e| matches!(e, WorkoutEvent::WorkoutCompleted { .. }))
        .unwrap();
    assert_eq!(
        completed,
        WorkoutEvent::WorkoutCompleted {
            workout_name: "Short".to_string(),
            total_seconds: 5.0,
        }
    );
}

#[test]
fn test_invalid_workout_rejected() {
    let mut engine = WorkoutEngine::new();
    let workout = Workout::new("  ", WorkoutKind::Custom, vec![WorkoutInterval::new(10, 100)]);
    assert!(matches!(
        engine.start(workout),
        Err(WorkoutError::InvalidWorkout(_))
    ));
    assert_eq!(engine.phase(), WorkoutPhase::Idle);
}
