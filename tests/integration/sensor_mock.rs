//! Integration tests with a mock trainer.
//!
//! The mock produces the byte streams a trainer would notify, so the whole
//! decode, integrate and estimate path can be exercised without hardware.

use spinlink::physics::SharedPhysics;
use spinlink::sensors::pipeline::TelemetryPipeline;
use spinlink::sensors::profile::DeviceProfile;
use spinlink::sensors::types::{FrameFormat, RawNotification, ValueSource};
use std::time::{Duration, Instant};

/// Mock trainer state advanced one second at a time.
pub struct MockTrainer {
    /// Current power value
    pub power: u16,
    /// Wheel revolutions per second
    pub wheel_rps: u32,
    /// Crank revolutions per second
    pub crank_rps: u16,
    wheel_revs: u32,
    wheel_time: u16,
    crank_revs: u16,
    crank_time: u16,
    started: Instant,
    tick: u64,
}

impl MockTrainer {
    pub fn new(power: u16, wheel_rps: u32, crank_rps: u16) -> Self {
        Self {
            power,
            wheel_rps,
            crank_rps,
            wheel_revs: 0,
            wheel_time: 0,
            crank_revs: 0,
            crank_time: 0,
            started: Instant::now(),
            tick: 0,
        }
    }

    /// Start counters close to their wrap points.
    pub fn near_wrap(mut self) -> Self {
        self.wheel_revs = u32::MAX - 1;
        self.wheel_time = u16::MAX - 1000;
        self.crank_revs = u16::MAX;
        self.crank_time = u16::MAX - 500;
        self
    }

    /// Cycling Power Measurement with wheel and crank data (flags 0x0030).
    pub fn next_cycling_power(&mut self) -> RawNotification {
        let mut data = vec![0x30, 0x00];
        data.extend_from_slice(&(self.power as i16).to_le_bytes());
        data.extend_from_slice(&self.wheel_revs.to_le_bytes());
        data.extend_from_slice(&self.wheel_time.to_le_bytes());
        data.extend_from_slice(&self.crank_revs.to_le_bytes());
        data.extend_from_slice(&self.crank_time.to_le_bytes());

        let at = self.started + Duration::from_secs(self.tick);
        self.tick += 1;
        self.wheel_revs = self.wheel_revs.wrapping_add(self.wheel_rps);
        self.wheel_time = self.wheel_time.wrapping_add(2048);
        self.crank_revs = self.crank_revs.wrapping_add(self.crank_rps);
        self.crank_time = self.crank_time.wrapping_add(1024);

        RawNotification::at(FrameFormat::CyclingPower, data, at)
    }

    /// KICKR-style Indoor Bike Data: speed under the cadence bit, raw
    /// cadence under the power bit, power at bytes 6-7.
    pub fn next_kickr_indoor_bike(&mut self, speed_kmh: f32, cadence_rpm: u16) -> RawNotification {
        let mut data = vec![0x44, 0x00];
        data.extend_from_slice(&((speed_kmh * 100.0).round() as u16).to_le_bytes());
        data.extend_from_slice(&(cadence_rpm * 2).to_le_bytes());
        data.extend_from_slice(&self.power.to_le_bytes());

        let at = self.started + Duration::from_secs(self.tick);
        self.tick += 1;
        RawNotification::at(FrameFormat::IndoorBikeData, data, at)
    }
}

fn pipeline() -> TelemetryPipeline {
    TelemetryPipeline::new(DeviceProfile::default(), 2.1, SharedPhysics::default())
}

#[test]
fn test_revolutions_drive_speed_and_cadence() {
    let mut trainer = MockTrainer::new(220, 4, 1);
    let mut pipeline = pipeline();

    // First frame has no history; values come from estimates
    let first = pipeline.process(&trainer.next_cycling_power());
    assert_eq!(first.speed_source, Some(ValueSource::Estimated));
    assert!(first.distance_delta_m.is_none());

    for _ in 0..5 {
        let sample = pipeline.process(&trainer.next_cycling_power());
        assert_eq!(sample.power_watts, 220);
        assert_eq!(sample.speed_source, Some(ValueSource::Revolutions));
        assert_eq!(sample.cadence_source, Some(ValueSource::Revolutions));
        // 4 rev/s * 2.1 m = 8.4 m/s = 30.24 km/h
        assert!((sample.speed_kmh.unwrap() - 30.24).abs() < 0.01);
        assert!((sample.distance_delta_m.unwrap() - 8.4).abs() < 1e-3);
        assert!((sample.cadence_rpm.unwrap() - 60.0).abs() < 1e-3);
    }
}

#[test]
fn test_counter_wraparound_is_seamless() {
    let mut trainer = MockTrainer::new(180, 3, 1).near_wrap();
    let mut pipeline = pipeline();
    pipeline.process(&trainer.next_cycling_power());

    for _ in 0..3 {
        let sample = pipeline.process(&trainer.next_cycling_power());
        assert!((sample.distance_delta_m.unwrap() - 6.3).abs() < 1e-3);
        assert!((sample.cadence_rpm.unwrap() - 60.0).abs() < 1e-3);
    }
}

#[test]
fn test_reset_after_reconnect() {
    let mut trainer = MockTrainer::new(200, 4, 1);
    let mut pipeline = pipeline();
    pipeline.process(&trainer.next_cycling_power());
    pipeline.process(&trainer.next_cycling_power());

    pipeline.reset();
    let after = pipeline.process(&trainer.next_cycling_power());
    assert!(after.distance_delta_m.is_none());
    assert_eq!(after.sequence, 2);
}

#[test]
fn test_kickr_indoor_bike_stream() {
    let mut trainer = MockTrainer::new(275, 0, 0);
    let mut pipeline = pipeline();

    let sample = pipeline.process(&trainer.next_kickr_indoor_bike(32.5, 88));
    assert_eq!(sample.power_watts, 275);
    assert_eq!(sample.cadence_rpm, Some(88.0));
    assert_eq!(sample.cadence_source, Some(ValueSource::Sensor));
    assert!((sample.speed_kmh.unwrap() - 32.5).abs() < 0.01);
    assert_eq!(sample.speed_source, Some(ValueSource::Sensor));
    assert!(!sample.low_confidence);
}

#[test]
fn test_kickr_spike_is_low_confidence() {
    let mut trainer = MockTrainer::new(3000, 0, 0);
    let mut pipeline = pipeline();

    let sample = pipeline.process(&trainer.next_kickr_indoor_bike(0.0, 90));
    assert!(sample.low_confidence);
    assert_eq!(sample.power_watts, 0);
    assert_eq!(sample.cadence_rpm, Some(90.0));
    assert_eq!(pipeline.stats().power_rejected, 1);
}
