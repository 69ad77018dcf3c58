//! Workout types and enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// Default warm-up and cool-down length in seconds.
pub const DEFAULT_WARMUP_SECONDS: u32 = 300;
pub const DEFAULT_COOLDOWN_SECONDS: u32 = 300;

/// Kind of workout, used for display and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutKind {
    SteadyState,
    Intervals,
    Tempo,
    Sprint,
    #[default]
    Custom,
}

impl std::fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkoutKind::SteadyState => write!(f, "Steady State"),
            WorkoutKind::Intervals => write!(f, "Intervals"),
            WorkoutKind::Tempo => write!(f, "Tempo"),
            WorkoutKind::Sprint => write!(f, "Sprint"),
            WorkoutKind::Custom => write!(f, "Custom"),
        }
    }
}

/// One work interval, optionally followed by rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutInterval {
    /// Work duration in seconds
    pub duration_seconds: u32,
    /// Target power in watts
    pub target_power_watts: u16,
    /// Optional target cadence in RPM
    #[serde(default)]
    pub target_cadence_rpm: Option<u16>,
    /// Rest after this interval in seconds (0 = no rest)
    #[serde(default)]
    pub rest_seconds: u32,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl WorkoutInterval {
    /// Create an interval with a generated description.
    pub fn new(duration_seconds: u32, target_power_watts: u16) -> Self {
        Self {
            duration_seconds,
            target_power_watts,
            target_cadence_rpm: None,
            rest_seconds: 0,
            description: format!("{}s @ {}W", duration_seconds, target_power_watts),
        }
    }

    pub fn with_cadence(mut self, rpm: u16) -> Self {
        self.target_cadence_rpm = Some(rpm);
        self
    }

    pub fn with_rest(mut self, rest_seconds: u32) -> Self {
        self.rest_seconds = rest_seconds;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Description, falling back to the generated one when empty.
    pub fn label(&self) -> String {
        if self.description.is_empty() {
            format!("{}s @ {}W", self.duration_seconds, self.target_power_watts)
        } else {
            self.description.clone()
        }
    }
}

/// A structured workout. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Workout name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Workout kind
    #[serde(default)]
    pub kind: WorkoutKind,
    /// Ordered work intervals
    pub intervals: Vec<WorkoutInterval>,
    /// Warm-up duration in seconds
    #[serde(default = "default_warmup")]
    pub warmup_seconds: u32,
    /// Cool-down duration in seconds
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u32,
    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_warmup() -> u32 {
    DEFAULT_WARMUP_SECONDS
}

fn default_cooldown() -> u32 {
    DEFAULT_COOLDOWN_SECONDS
}

impl Workout {
    /// Create a new workout with default warm-up and cool-down.
    pub fn new(
        name: impl Into<String>,
        kind: WorkoutKind,
        intervals: Vec<WorkoutInterval>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            kind,
            intervals,
            warmup_seconds: DEFAULT_WARMUP_SECONDS,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            created_at: Utc::now(),
        }
    }

    pub fn with_warmup(mut self, seconds: u32) -> Self {
        self.warmup_seconds = seconds;
        self
    }

    pub fn with_cooldown(mut self, seconds: u32) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Warm-up + all intervals and rests + cool-down, in seconds.
    pub fn total_duration_seconds(&self) -> u64 {
        self.intervals
            .iter()
            .flat_map(|i| [i.duration_seconds, i.rest_seconds])
            .chain([self.warmup_seconds, self.cooldown_seconds])
            .fold(0u64, |total, seconds| total.saturating_add(u64::from(seconds)))
    }

    /// Check the workout can be executed.
    pub fn validate(&self) -> Result<(), WorkoutError> {
        if self.name.trim().is_empty() {
            return Err(WorkoutError::InvalidWorkout(
                "Workout name is empty".to_string(),
            ));
        }
        if let Some(idx) = self.intervals.iter().position(|i| i.duration_seconds == 0) {
            return Err(WorkoutError::InvalidWorkout(format!(
                "Interval {} has zero duration",
                idx + 1
            )));
        }
        let total = self.total_duration_seconds();
        if total > u64::from(u32::MAX) {
            return Err(WorkoutError::InvalidWorkout(format!(
                "Total duration of {}s is too long",
                total
            )));
        }
        Ok(())
    }
}

/// Phase of workout execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutPhase {
    #[default]
    Idle,
    Warmup,
    Interval,
    Rest,
    Cooldown,
    Completed,
    Stopped,
}

impl WorkoutPhase {
    /// Phases in which samples drive the workout.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            WorkoutPhase::Warmup
                | WorkoutPhase::Interval
                | WorkoutPhase::Rest
                | WorkoutPhase::Cooldown
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkoutPhase::Completed | WorkoutPhase::Stopped)
    }
}

impl std::fmt::Display for WorkoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkoutPhase::Idle => write!(f, "Idle"),
            WorkoutPhase::Warmup => write!(f, "Warmup"),
            WorkoutPhase::Interval => write!(f, "Interval"),
            WorkoutPhase::Rest => write!(f, "Rest"),
            WorkoutPhase::Cooldown => write!(f, "Cooldown"),
            WorkoutPhase::Completed => write!(f, "Completed"),
            WorkoutPhase::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Live state of an executing workout.
#[derive(Debug, Clone)]
pub struct WorkoutRunState {
    /// Current phase
    pub phase: WorkoutPhase,
    /// Current interval (during Rest: the interval just finished)
    pub interval_index: usize,
    /// When the current phase started
    pub phase_started_at: Instant,
    /// When the workout started
    pub started_at: Instant,
}

/// Where actual power sits relative to the interval target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachingHint {
    /// More than the tolerance below target
    Increase,
    /// Within the tolerance
    OnTarget,
    /// More than the tolerance above target
    Reduce,
}

impl CoachingHint {
    /// Band a signed power difference (actual - target).
    pub fn from_difference(difference_watts: i32, tolerance_watts: i32) -> Self {
        if difference_watts > tolerance_watts {
            CoachingHint::Reduce
        } else if difference_watts < -tolerance_watts {
            CoachingHint::Increase
        } else {
            CoachingHint::OnTarget
        }
    }
}

impl std::fmt::Display for CoachingHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoachingHint::Increase => write!(f, "Increase power"),
            CoachingHint::OnTarget => write!(f, "On target"),
            CoachingHint::Reduce => write!(f, "Reduce power"),
        }
    }
}

/// Real-time coaching output for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Guidance {
    /// Sequence of the sample this guidance answers
    pub sample_sequence: u64,
    pub phase: WorkoutPhase,
    /// Interval index for Interval and Rest phases
    pub interval_index: Option<usize>,
    /// Seconds spent in the current phase
    pub elapsed_seconds: f32,
    /// Seconds left in the current phase
    pub remaining_seconds: f32,
    /// Target power in watts
    pub target_power_watts: i32,
    /// Target cadence in RPM
    pub target_cadence_rpm: Option<u16>,
    /// Actual minus target power (intervals only, 0 otherwise)
    pub power_difference_watts: i32,
    /// Coaching band (intervals only)
    pub hint: Option<CoachingHint>,
    pub description: String,
}

/// Workout lifecycle events.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutEvent {
    WorkoutStarted {
        workout_name: String,
        warmup_seconds: u32,
    },
    IntervalStarted {
        index: usize,
        interval: WorkoutInterval,
    },
    RestStarted {
        after_interval: usize,
        rest_seconds: u32,
    },
    CooldownStarted {
        cooldown_seconds: u32,
    },
    WorkoutCompleted {
        workout_name: String,
        total_seconds: f32,
    },
    WorkoutStopped {
        workout_name: String,
        phase: WorkoutPhase,
    },
}

impl WorkoutEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            WorkoutEvent::WorkoutStarted { .. } => "workout_started",
            WorkoutEvent::IntervalStarted { .. } => "interval_started",
            WorkoutEvent::RestStarted { .. } => "rest_started",
            WorkoutEvent::CooldownStarted { .. } => "cooldown_started",
            WorkoutEvent::WorkoutCompleted { .. } => "workout_completed",
            WorkoutEvent::WorkoutStopped { .. } => "workout_stopped",
        }
    }
}

/// Errors related to workout operations.
#[derive(Debug, Error)]
pub enum WorkoutError {
    /// A workout is already running
    #[error("Workout already in progress")]
    AlreadyRunning,

    /// No workout is running
    #[error("No workout running")]
    NotRunning,

    /// Invalid workout structure
    #[error("Invalid workout: {0}")]
    InvalidWorkout(String),

    /// Workout file could not be read or written
    #[error("Failed to access workout file: {0}")]
    FileError(#[from] std::io::Error),

    /// Workout file could not be parsed
    #[error("Failed to parse workout: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Unknown built-in workout
    #[error("Workout not found: {0}")]
    NotFound(String),
}
