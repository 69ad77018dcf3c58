//! Workout execution engine.
//!
//! Drives a structured workout from the timestamps of incoming telemetry
//! samples. Phase boundaries are computed from exact phase durations, so a
//! late sample never shifts the schedule, and a single sample can cross
//! several zero-length phases at once.

use crate::broadcast::Broadcaster;
use crate::sensors::types::TelemetrySample;
use crate::workouts::types::{
    CoachingHint, Guidance, Workout, WorkoutError, WorkoutEvent, WorkoutPhase, WorkoutRunState,
};
use crossbeam::channel::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Power band around the interval target treated as on target.
pub const POWER_TOLERANCE_WATTS: i32 = 20;

/// Warm-up target as a fraction of current power.
const WARMUP_POWER_FACTOR: f32 = 0.5;
/// Rest target as a fraction of current power.
const REST_POWER_FACTOR: f32 = 0.3;
/// Cool-down target as a fraction of current power.
const COOLDOWN_POWER_FACTOR: f32 = 0.4;

/// Default queue depth for lifecycle event subscribers.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Workout execution engine.
pub struct WorkoutEngine {
    /// Workout being executed
    workout: Option<Workout>,
    /// Live run state while active
    run: Option<WorkoutRunState>,
    /// Last phase reached (Idle, Completed or Stopped when not running)
    phase: WorkoutPhase,
    /// Lifecycle event fan-out
    events: Arc<Broadcaster<WorkoutEvent>>,
}

impl WorkoutEngine {
    pub fn new() -> Self {
        Self::with_events(Arc::new(Broadcaster::new(
            "workout-events",
            DEFAULT_EVENT_CAPACITY,
        )))
    }

    /// Create an engine publishing to an existing broadcaster.
    pub fn with_events(events: Arc<Broadcaster<WorkoutEvent>>) -> Self {
        Self {
            workout: None,
            run: None,
            phase: WorkoutPhase::Idle,
            events,
        }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> Receiver<WorkoutEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &Arc<Broadcaster<WorkoutEvent>> {
        &self.events
    }

    /// Start a workout now.
    pub fn start(&mut self, workout: Workout) -> Result<(), WorkoutError> {
        self.start_at(workout, Instant::now())
    }

    /// Start a workout with an explicit start time.
    pub fn start_at(&mut self, workout: Workout, now: Instant) -> Result<(), WorkoutError> {
        if self.phase.is_active() {
            return Err(WorkoutError::AlreadyRunning);
        }
        workout.validate()?;

        tracing::info!(
            "Starting workout '{}' ({} intervals, {}s)",
            workout.name,
            workout.intervals.len(),
            workout.total_duration_seconds()
        );

        self.run = Some(WorkoutRunState {
            phase: WorkoutPhase::Warmup,
            interval_index: 0,
            phase_started_at: now,
            started_at: now,
        });
        self.phase = WorkoutPhase::Warmup;
        self.emit(WorkoutEvent::WorkoutStarted {
            workout_name: workout.name.clone(),
            warmup_seconds: workout.warmup_seconds,
        });
        self.workout = Some(workout);
        Ok(())
    }

    /// Stop the running workout.
    pub fn stop(&mut self) -> Result<(), WorkoutError> {
        if !self.phase.is_active() {
            return Err(WorkoutError::NotRunning);
        }

        let stopped_in = self.phase;
        self.phase = WorkoutPhase::Stopped;
        self.run = None;

        let workout_name = self
            .workout
            .take()
            .map(|w| w.name)
            .unwrap_or_default();
        tracing::info!("Workout '{}' stopped during {}", workout_name, stopped_in);
        self.emit(WorkoutEvent::WorkoutStopped {
            workout_name,
            phase: stopped_in,
        });
        Ok(())
    }

    /// Advance the workout with one sample and produce guidance.
    ///
    /// Returns `None` when no workout is active, including for the sample
    /// that completes the workout.
    pub fn update(&mut self, sample: &TelemetrySample) -> Option<Guidance> {
        let now = sample.timestamp;

        // Cross every boundary the sample has passed
        while self.advance(now) {}

        let workout = self.workout.as_ref()?;
        let run = self.run.as_ref()?;
        let elapsed = now
            .saturating_duration_since(run.phase_started_at)
            .as_secs_f32();
        let power = sample.power_watts;

        let guidance = match run.phase {
            WorkoutPhase::Warmup => relative_guidance(
                sample,
                run.phase,
                None,
                elapsed,
                workout.warmup_seconds,
                WARMUP_POWER_FACTOR,
                "Warm-up",
            ),
            WorkoutPhase::Rest => {
                let rest = workout
                    .intervals
                    .get(run.interval_index)
                    .map_or(0, |i| i.rest_seconds);
                relative_guidance(
                    sample,
                    run.phase,
                    Some(run.interval_index),
                    elapsed,
                    rest,
                    REST_POWER_FACTOR,
                    "Recovery",
                )
            }
            WorkoutPhase::Cooldown => relative_guidance(
                sample,
                run.phase,
                None,
                elapsed,
                workout.cooldown_seconds,
                COOLDOWN_POWER_FACTOR,
                "Cool-down",
            ),
            WorkoutPhase::Interval => {
                let interval = workout.intervals.get(run.interval_index)?;
                let target = i32::from(interval.target_power_watts);
                let difference = i32::from(power) - target;
                Guidance {
                    sample_sequence: sample.sequence,
                    phase: run.phase,
                    interval_index: Some(run.interval_index),
                    elapsed_seconds: elapsed,
                    remaining_seconds: remaining(interval.duration_seconds, elapsed),
                    target_power_watts: target,
                    target_cadence_rpm: interval.target_cadence_rpm,
                    power_difference_watts: difference,
                    hint: Some(CoachingHint::from_difference(
                        difference,
                        POWER_TOLERANCE_WATTS,
                    )),
                    description: interval.label(),
                }
            }
            _ => return None,
        };

        Some(guidance)
    }

    /// Perform at most one phase transition. Returns true if one happened.
    fn advance(&mut self, now: Instant) -> bool {
        let (Some(workout), Some(run)) = (self.workout.as_ref(), self.run.as_ref()) else {
            return false;
        };

        let elapsed = now.saturating_duration_since(run.phase_started_at);
        let phase_length = match run.phase {
            WorkoutPhase::Warmup => workout.warmup_seconds,
            WorkoutPhase::Interval => workout
                .intervals
                .get(run.interval_index)
                .map_or(0, |i| i.duration_seconds),
            WorkoutPhase::Rest => workout
                .intervals
                .get(run.interval_index)
                .map_or(0, |i| i.rest_seconds),
            WorkoutPhase::Cooldown => workout.cooldown_seconds,
            _ => return false,
        };
        let phase_length = Duration::from_secs(u64::from(phase_length));
        if elapsed < phase_length {
            return false;
        }

        let boundary = run.phase_started_at + phase_length;
        let interval_count = workout.intervals.len();
        let index = run.interval_index;
        let phase = run.phase;
        let rest = workout.intervals.get(index).map_or(0, |i| i.rest_seconds);

        match phase {
            WorkoutPhase::Warmup => {
                if interval_count > 0 {
                    self.begin_interval(0, boundary);
                } else {
                    self.begin_cooldown(boundary);
                }
            }
            WorkoutPhase::Interval => {
                let has_next = index + 1 < interval_count;
                if has_next && rest > 0 {
                    self.set_phase(WorkoutPhase::Rest, index, boundary);
                    tracing::debug!("Rest after interval {} ({}s)", index + 1, rest);
                    self.emit(WorkoutEvent::RestStarted {
                        after_interval: index,
                        rest_seconds: rest,
                    });
                } else if has_next {
                    self.begin_interval(index + 1, boundary);
                } else {
                    self.begin_cooldown(boundary);
                }
            }
            WorkoutPhase::Rest => self.begin_interval(index + 1, boundary),
            WorkoutPhase::Cooldown => {
                self.complete(boundary);
                return false;
            }
            _ => return false,
        }

        true
    }

    fn begin_interval(&mut self, index: usize, at: Instant) {
        let Some(interval) = self
            .workout
            .as_ref()
            .and_then(|w| w.intervals.get(index))
            .cloned()
        else {
            self.begin_cooldown(at);
            return;
        };

        self.set_phase(WorkoutPhase::Interval, index, at);
        tracing::info!("Interval {}: {}", index + 1, interval.label());
        self.emit(WorkoutEvent::IntervalStarted { index, interval });
    }

    fn begin_cooldown(&mut self, at: Instant) {
        let cooldown_seconds = self.workout.as_ref().map_or(0, |w| w.cooldown_seconds);
        let index = self.run.as_ref().map_or(0, |r| r.interval_index);
        self.set_phase(WorkoutPhase::Cooldown, index, at);
        tracing::debug!("Cool-down started ({}s)", cooldown_seconds);
        self.emit(WorkoutEvent::CooldownStarted { cooldown_seconds });
    }

    fn complete(&mut self, at: Instant) {
        let total_seconds = self
            .run
            .take()
            .map_or(0.0, |r| at.saturating_duration_since(r.started_at).as_secs_f32());
        let workout_name = self
            .workout
            .take()
            .map(|w| w.name)
            .unwrap_or_default();
        self.phase = WorkoutPhase::Completed;

        tracing::info!("Workout '{}' completed in {:.0}s", workout_name, total_seconds);
        self.emit(WorkoutEvent::WorkoutCompleted {
            workout_name,
            total_seconds,
        });
    }

    fn set_phase(&mut self, phase: WorkoutPhase, interval_index: usize, at: Instant) {
        if let Some(run) = self.run.as_mut() {
            run.phase = phase;
            run.interval_index = interval_index;
            run.phase_started_at = at;
        }
        self.phase = phase;
    }

    fn emit(&self, event: WorkoutEvent) {
        let name = event.name();
        let report = self.events.publish(event);
        if report.dropped > 0 {
            tracing::warn!("Workout event '{}' dropped for {} subscriber(s)", name, report.dropped);
        }
    }

    /// Current phase
    pub fn phase(&self) -> WorkoutPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Workout being executed, if any
    pub fn workout(&self) -> Option<&Workout> {
        self.workout.as_ref()
    }

    /// Live run state, if a workout is active
    pub fn run_state(&self) -> Option<&WorkoutRunState> {
        self.run.as_ref()
    }
}

impl Default for WorkoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn remaining(phase_seconds: u32, elapsed: f32) -> f32 {
    (phase_seconds as f32 - elapsed).max(0.0)
}

fn relative_guidance(
    sample: &TelemetrySample,
    phase: WorkoutPhase,
    interval_index: Option<usize>,
    elapsed: f32,
    phase_seconds: u32,
    factor: f32,
    description: &str,
) -> Guidance {
    Guidance {
        sample_sequence: sample.sequence,
        phase,
        interval_index,
        elapsed_seconds: elapsed,
        remaining_seconds: remaining(phase_seconds, elapsed),
        // Truncates toward zero
        target_power_watts: (f32::from(sample.power_watts) * factor) as i32,
        target_cadence_rpm: None,
        power_difference_watts: 0,
        hint: None,
        description: description.to_string(),
    }
}
