//! Notification-to-sample pipeline.
//!
//! Decodes each notification with the device profile, then fills the fields
//! the frame did not carry: from revolution counters when present, otherwise
//! from the physics and cadence estimates. Exactly one sample is produced per
//! notification, malformed or not.

use crate::physics::{CadenceEstimator, PhysicsParameters, SharedPhysics, SpeedPhysicsModel};
use crate::sensors::decoder::FrameDecoder;
use crate::sensors::integrator::WheelCrankIntegrator;
use crate::sensors::profile::DeviceProfile;
use crate::sensors::types::{DecodedFields, RawNotification, TelemetrySample, ValueSource};
use std::sync::Arc;
use std::time::Instant;

/// Counters describing the frames a pipeline has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames processed (equals samples emitted)
    pub frames: u64,
    /// Frames with at least one truncated field
    pub truncated: u64,
    /// Samples without a usable power value
    pub low_confidence: u64,
    /// Power candidates rejected as implausible
    pub power_rejected: u64,
}

/// Per-device telemetry pipeline.
pub struct TelemetryPipeline {
    profile: DeviceProfile,
    integrator: WheelCrankIntegrator,
    physics: SharedPhysics,
    next_sequence: u64,
    prev_total_distance_m: Option<u32>,
    stats: PipelineStats,
}

impl TelemetryPipeline {
    pub fn new(profile: DeviceProfile, wheel_circumference_m: f32, physics: SharedPhysics) -> Self {
        tracing::info!(
            "Telemetry pipeline using profile '{}' ({}, {})",
            profile.name,
            profile.cycling_power.qualified_name(),
            profile.indoor_bike.qualified_name()
        );

        Self {
            profile,
            integrator: WheelCrankIntegrator::new(wheel_circumference_m),
            physics,
            next_sequence: 0,
            prev_total_distance_m: None,
            stats: PipelineStats::default(),
        }
    }

    /// Turn one notification into one sample.
    pub fn process(&mut self, raw: &RawNotification) -> TelemetrySample {
        let layout = Arc::clone(self.profile.layout_for(raw.format));
        let params = self.physics.snapshot();
        let decoded = FrameDecoder::decode(raw, &layout);

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let mut sample = build_sample(
            &decoded,
            &mut self.integrator,
            &params,
            sequence,
            raw.received_at,
        );

        if sample.distance_delta_m.is_none() {
            sample.distance_delta_m = self.total_distance_delta(decoded.total_distance_m);
        } else if decoded.total_distance_m.is_some() {
            self.prev_total_distance_m = decoded.total_distance_m;
        }

        self.stats.frames += 1;
        if decoded.is_truncated() {
            self.stats.truncated += 1;
        }
        if sample.low_confidence {
            self.stats.low_confidence += 1;
        }
        if decoded.power_rejected {
            self.stats.power_rejected += 1;
        }

        tracing::trace!(
            "Sample #{}: {}W, {:?} km/h, {:?} rpm",
            sample.sequence,
            sample.power_watts,
            sample.speed_kmh,
            sample.cadence_rpm
        );

        sample
    }

    /// Distance since the previous frame from the device's total distance.
    fn total_distance_delta(&mut self, total_m: Option<u32>) -> Option<f32> {
        let total = total_m?;
        let prev = self.prev_total_distance_m.replace(total)?;
        // A lower total means the trainer reset its counter
        total.checked_sub(prev).map(|d| d as f32)
    }

    /// Forget counter history after a reconnect. Sequence numbers continue.
    pub fn reset(&mut self) {
        self.integrator.reset();
        self.prev_total_distance_m = None;
        tracing::debug!("Telemetry pipeline reset at sequence {}", self.next_sequence);
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn physics(&self) -> &SharedPhysics {
        &self.physics
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }
}

/// Build the canonical sample for one decoded frame.
pub fn build_sample(
    decoded: &DecodedFields,
    integrator: &mut WheelCrankIntegrator,
    params: &PhysicsParameters,
    sequence: u64,
    timestamp: Instant,
) -> TelemetrySample {
    let mut sample = match decoded.power_watts {
        Some(power) => TelemetrySample::with_power(sequence, timestamp, power),
        None => TelemetrySample::empty(sequence, timestamp),
    };
    sample.avg_power_watts = decoded.avg_power_watts;
    sample.heart_rate_bpm = decoded.heart_rate_bpm;
    sample.quality = decoded.quality;

    if let Some(speed) = decoded.speed_kmh {
        sample.speed_kmh = Some(speed);
        sample.speed_source = Some(ValueSource::Sensor);
    }
    if let Some(cadence) = decoded.cadence_rpm {
        sample.cadence_rpm = Some(cadence);
        sample.cadence_source = Some(ValueSource::Sensor);
    }

    if decoded.has_revolution_data() {
        let deltas = integrator.update(decoded.wheel, decoded.crank);
        sample.distance_delta_m = deltas.distance_m;
        if sample.speed_kmh.is_none() {
            if let Some(speed) = deltas.speed_kmh {
                sample.speed_kmh = Some(speed);
                sample.speed_source = Some(ValueSource::Revolutions);
            }
        }
        if sample.cadence_rpm.is_none() {
            if let Some(cadence) = deltas.cadence_rpm {
                sample.cadence_rpm = Some(cadence);
                sample.cadence_source = Some(ValueSource::Revolutions);
            }
        }
    }

    // Estimates need a reported power value
    if let Some(power) = decoded.power_watts {
        if sample.speed_kmh.is_none() {
            sample.speed_kmh = Some(SpeedPhysicsModel::estimate_speed_kmh(
                f32::from(power),
                params,
            ));
            sample.speed_source = Some(ValueSource::Estimated);
        }
        if sample.cadence_rpm.is_none() {
            sample.cadence_rpm = Some(f32::from(CadenceEstimator::estimate_rpm(i32::from(
                power,
            ))));
            sample.cadence_source = Some(ValueSource::Estimated);
        }
    }

    sample
}
