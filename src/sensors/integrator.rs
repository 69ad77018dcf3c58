//! Wheel and crank revolution integration.
//!
//! Converts the cumulative revolution counters of the power measurement
//! format into instantaneous speed, distance and cadence by finite
//! differences against the previous frame.

use crate::sensors::types::{CrankRevolutionData, WheelRevolutionData};

/// Wheel event time resolution (ticks per second).
const WHEEL_TIME_RESOLUTION: f64 = 2048.0;
/// Crank event time resolution (ticks per second).
const CRANK_TIME_RESOLUTION: f64 = 1024.0;
/// Default wheel circumference in meters (700x25c road tyre).
pub const DEFAULT_WHEEL_CIRCUMFERENCE_M: f32 = 2.1;

/// Values derived from one pair of revolution blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RevolutionDeltas {
    /// Speed in km/h
    pub speed_kmh: Option<f32>,
    /// Distance since the previous wheel event in meters
    pub distance_m: Option<f32>,
    /// Cadence in RPM
    pub cadence_rpm: Option<f32>,
}

impl RevolutionDeltas {
    pub fn is_empty(&self) -> bool {
        self.speed_kmh.is_none() && self.distance_m.is_none() && self.cadence_rpm.is_none()
    }
}

/// Stateful integrator bound to one device connection.
#[derive(Debug, Clone)]
pub struct WheelCrankIntegrator {
    wheel_circumference_m: f32,
    prev_wheel: Option<WheelRevolutionData>,
    prev_crank: Option<CrankRevolutionData>,
}

impl WheelCrankIntegrator {
    pub fn new(wheel_circumference_m: f32) -> Self {
        Self {
            wheel_circumference_m,
            prev_wheel: None,
            prev_crank: None,
        }
    }

    pub fn wheel_circumference_m(&self) -> f32 {
        self.wheel_circumference_m
    }

    /// Feed the revolution blocks of one frame.
    ///
    /// The first block after a reset and blocks whose event time did not
    /// change produce nothing. The stored previous state is replaced on every
    /// call, so a bad frame only affects the delta it takes part in.
    pub fn update(
        &mut self,
        wheel: Option<WheelRevolutionData>,
        crank: Option<CrankRevolutionData>,
    ) -> RevolutionDeltas {
        let mut deltas = RevolutionDeltas::default();

        if let Some(current) = wheel {
            if let Some(prev) = self.prev_wheel.replace(current) {
                let ticks = current.last_event_time.wrapping_sub(prev.last_event_time);
                let revs = current
                    .cumulative_revolutions
                    .wrapping_sub(prev.cumulative_revolutions);

                if ticks > 0 {
                    let elapsed_s = f64::from(ticks) / WHEEL_TIME_RESOLUTION;
                    let circumference = f64::from(self.wheel_circumference_m);
                    let rpm = f64::from(revs) * 60.0 / elapsed_s;
                    deltas.speed_kmh = Some((rpm * circumference * 60.0 / 1000.0) as f32);
                    deltas.distance_m = Some((f64::from(revs) * circumference) as f32);
                } else {
                    tracing::trace!("Duplicate wheel event time {}", current.last_event_time);
                }
            }
        }

        if let Some(current) = crank {
            if let Some(prev) = self.prev_crank.replace(current) {
                let ticks = current.last_event_time.wrapping_sub(prev.last_event_time);
                let revs = current
                    .cumulative_revolutions
                    .wrapping_sub(prev.cumulative_revolutions);

                if ticks > 0 {
                    let elapsed_s = f64::from(ticks) / CRANK_TIME_RESOLUTION;
                    deltas.cadence_rpm = Some((f64::from(revs) * 60.0 / elapsed_s) as f32);
                } else {
                    tracing::trace!("Duplicate crank event time {}", current.last_event_time);
                }
            }
        }

        deltas
    }

    /// Forget previous counters, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.prev_wheel = None;
        self.prev_crank = None;
    }
}

impl Default for WheelCrankIntegrator {
    fn default() -> Self {
        Self::new(DEFAULT_WHEEL_CIRCUMFERENCE_M)
    }
}
