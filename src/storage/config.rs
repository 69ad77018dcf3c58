//! Application configuration.
//!
//! Loaded from `config.toml` in the platform config directory. Missing
//! files and missing sections fall back to defaults.

use crate::physics::PhysicsParameters;
use crate::sensors::integrator::DEFAULT_WHEEL_CIRCUMFERENCE_M;
use crate::sensors::profile::{DeviceProfile, PowerBounds, ProfileError, KICKR_PROFILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Trainer settings
    pub trainer: TrainerSettings,
    /// Speed model parameters
    pub physics: PhysicsParameters,
    /// Queue sizing
    pub pipeline: PipelineSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            trainer: TrainerSettings::default(),
            physics: PhysicsParameters::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl AppConfig {
    /// Check values are within physically sensible ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        check_range("physics.rider_mass_kg", p.rider_mass_kg, 30.0, 200.0)?;
        check_range("physics.bike_mass_kg", p.bike_mass_kg, 3.0, 30.0)?;
        check_range("physics.gradient_percent", p.gradient_percent, -50.0, 50.0)?;
        if !(p.crr.is_finite() && p.crr > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "physics.crr must be positive, got {}",
                p.crr
            )));
        }
        if !(p.cda.is_finite() && p.cda > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "physics.cda must be positive, got {}",
                p.cda
            )));
        }

        let t = &self.trainer;
        check_range(
            "trainer.wheel_circumference_m",
            t.wheel_circumference_m,
            1.0,
            3.0,
        )?;
        if t.power_bounds.min_watts > t.power_bounds.max_watts {
            return Err(ConfigError::Invalid(format!(
                "trainer.power_bounds: min {} exceeds max {}",
                t.power_bounds.min_watts, t.power_bounds.max_watts
            )));
        }
        t.device_profile()?;

        if self.pipeline.sample_queue_capacity == 0 || self.pipeline.event_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "pipeline queue capacities must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}

/// Trainer-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerSettings {
    /// Device profile name ("standard" or "kickr")
    pub profile: String,
    /// Wheel circumference in meters
    pub wheel_circumference_m: f32,
    /// Plausible power range for the KICKR power override
    pub power_bounds: PowerBounds,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            profile: KICKR_PROFILE.to_string(),
            wheel_circumference_m: DEFAULT_WHEEL_CIRCUMFERENCE_M,
            power_bounds: PowerBounds::default(),
        }
    }
}

impl TrainerSettings {
    /// Resolve the configured device profile.
    pub fn device_profile(&self) -> Result<DeviceProfile, ProfileError> {
        DeviceProfile::by_name(&self.profile, self.power_bounds)
    }
}

/// Subscriber queue sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Queue depth per sample subscriber
    pub sample_queue_capacity: usize,
    /// Queue depth per event and guidance subscriber
    pub event_queue_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sample_queue_capacity: 256,
            event_queue_capacity: 64,
        }
    }
}

/// Get the application config directory.
pub fn get_config_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "spinlink", "Spinlink")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "spinlink", "Spinlink")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load application configuration from a file. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig {
            data_dir: get_data_dir(),
            ..Default::default()
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;

    config.data_dir = get_data_dir();
    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to a file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ProfileError> for ConfigError {
    fn from(e: ProfileError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}
