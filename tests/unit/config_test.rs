//! Unit tests for configuration and workout files.

use spinlink::storage::config::{load_config_from, save_config_to, AppConfig, ConfigError};
use spinlink::workouts::library::{intervals, load_workout, save_workout};
use spinlink::workouts::types::WorkoutError;
use tempfile::tempdir;

#[test]
fn test_missing_config_gives_defaults() {
    let dir = tempdir().unwrap();
    let config = load_config_from(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config.trainer.profile, "kickr");
    assert_eq!(config.physics.rider_mass_kg, 75.0);
}

#[test]
fn test_config_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.trainer.profile = "standard".to_string();
    config.trainer.wheel_circumference_m = 2.096;
    config.physics.gradient_percent = -2.5;
    save_config_to(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded.trainer, config.trainer);
    assert_eq!(loaded.physics, config.physics);
    assert_eq!(loaded.pipeline, config.pipeline);
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[trainer]\nwheel_circumference_m = 5.0\n").unwrap();

    assert!(matches!(
        load_config_from(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[physics\nrider_mass_kg = ").unwrap();

    assert!(matches!(
        load_config_from(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_workout_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("workouts").join("vo2.json");

    let workout = intervals(180, 120, 320, 5);
    save_workout(&workout, &path).unwrap();
    let loaded = load_workout(&path).unwrap();

    assert_eq!(loaded.id, workout.id);
    assert_eq!(loaded.name, workout.name);
    assert_eq!(loaded.intervals, workout.intervals);
    assert_eq!(loaded.total_duration_seconds(), workout.total_duration_seconds());
}

#[test]
fn test_missing_workout_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_workout(&dir.path().join("nope.json")),
        Err(WorkoutError::FileError(_))
    ));
}

#[test]
fn test_overlong_workout_file_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("endless.json");
    std::fs::write(
        &path,
        r#"{"name": "Endless", "intervals": [{"duration_seconds": 4294967295, "target_power_watts": 200}]}"#,
    )
    .unwrap();

    assert!(matches!(
        load_workout(&path),
        Err(WorkoutError::InvalidWorkout(_))
    ));
}
