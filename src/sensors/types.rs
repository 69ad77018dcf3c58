//! Telemetry types shared by the decoder, integrator and pipeline.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wire format of a telemetry characteristic.
///
/// A trainer may expose both formats at once; each notification carries the
/// format of the characteristic it arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameFormat {
    /// Cycling Power Measurement (0x2A63)
    CyclingPower,
    /// FTMS Indoor Bike Data (0x2AD2)
    IndoorBikeData,
}

impl std::fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameFormat::CyclingPower => write!(f, "Cycling Power"),
            FrameFormat::IndoorBikeData => write!(f, "Indoor Bike Data"),
        }
    }
}

/// One notification payload as delivered by the radio link.
#[derive(Debug, Clone)]
pub struct RawNotification {
    /// Characteristic format the payload was received on
    pub format: FrameFormat,
    /// Raw payload bytes
    pub data: Vec<u8>,
    /// When the transport received the notification
    pub received_at: Instant,
}

impl RawNotification {
    /// Wrap a payload received now.
    pub fn new(format: FrameFormat, data: impl Into<Vec<u8>>) -> Self {
        Self::at(format, data, Instant::now())
    }

    /// Wrap a payload with an explicit receive time.
    pub fn at(format: FrameFormat, data: impl Into<Vec<u8>>, received_at: Instant) -> Self {
        Self {
            format,
            data: data.into(),
            received_at,
        }
    }
}

/// Whether every flag-declared field could be read from the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeQuality {
    /// All declared fields were present
    #[default]
    Complete,
    /// At least one declared field ran past the end of the payload
    Truncated,
}

/// Cumulative wheel revolution block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelRevolutionData {
    /// Cumulative wheel revolutions (wraps at 2^32)
    pub cumulative_revolutions: u32,
    /// Last wheel event time in 1/2048 s (wraps at 2^16)
    pub last_event_time: u16,
}

/// Cumulative crank revolution block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrankRevolutionData {
    /// Cumulative crank revolutions (wraps at 2^16)
    pub cumulative_revolutions: u16,
    /// Last crank event time in 1/1024 s (wraps at 2^16)
    pub last_event_time: u16,
}

/// Sparse result of decoding one frame.
///
/// Every value is already scaled to physical units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFields {
    /// Raw flags word
    pub flags: u16,
    /// Instantaneous power in watts
    pub power_watts: Option<i16>,
    /// Average power in watts
    pub avg_power_watts: Option<i16>,
    /// Instantaneous cadence in RPM
    pub cadence_rpm: Option<f32>,
    /// Average cadence in RPM
    pub avg_cadence_rpm: Option<f32>,
    /// Instantaneous speed in km/h
    pub speed_kmh: Option<f32>,
    /// Average speed in km/h
    pub avg_speed_kmh: Option<f32>,
    /// Total distance in meters
    pub total_distance_m: Option<u32>,
    /// Resistance level (unitless)
    pub resistance_level: Option<i16>,
    /// Pedal power balance in percent
    pub pedal_power_balance_pct: Option<f32>,
    /// Accumulated torque in Nm
    pub accumulated_torque_nm: Option<f32>,
    /// Accumulated energy in kJ
    pub accumulated_energy_kj: Option<u16>,
    /// Total expended energy in kcal
    pub total_energy_kcal: Option<u16>,
    /// Energy per hour in kcal
    pub energy_per_hour_kcal: Option<u16>,
    /// Energy per minute in kcal
    pub energy_per_minute_kcal: Option<u8>,
    /// Heart rate in BPM
    pub heart_rate_bpm: Option<u8>,
    /// Metabolic equivalent
    pub metabolic_equivalent: Option<f32>,
    /// Elapsed time in seconds
    pub elapsed_time_s: Option<u16>,
    /// Remaining time in seconds
    pub remaining_time_s: Option<u16>,
    /// Wheel revolution block
    pub wheel: Option<WheelRevolutionData>,
    /// Crank revolution block
    pub crank: Option<CrankRevolutionData>,
    /// Set when a power candidate was read but fell outside the plausible range
    pub power_rejected: bool,
    /// Decode completeness
    pub quality: DecodeQuality,
}

impl DecodedFields {
    /// Whether the frame carried any revolution counters.
    pub fn has_revolution_data(&self) -> bool {
        self.wheel.is_some() || self.crank.is_some()
    }

    pub fn is_truncated(&self) -> bool {
        self.quality == DecodeQuality::Truncated
    }
}

/// Where a derived sample value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Reported directly by the device
    Sensor,
    /// Derived from wheel/crank revolution counters
    Revolutions,
    /// Estimated from power
    Estimated,
}

/// Canonical telemetry sample, one per processed notification.
#[derive(Debug, Clone)]
pub struct TelemetrySample {
    /// Monotonic position in the device's sample stream (starts at 0)
    pub sequence: u64,
    /// Receive time of the notification
    pub timestamp: Instant,
    /// Instantaneous power in watts, passed through unclamped
    pub power_watts: i16,
    /// Average power in watts
    pub avg_power_watts: Option<i16>,
    /// Cadence in RPM
    pub cadence_rpm: Option<f32>,
    /// Speed in km/h
    pub speed_kmh: Option<f32>,
    /// Distance travelled since the previous sample in meters
    pub distance_delta_m: Option<f32>,
    /// Heart rate in BPM
    pub heart_rate_bpm: Option<u8>,
    /// True when the frame carried no usable power value
    pub low_confidence: bool,
    /// Decode completeness of the source frame
    pub quality: DecodeQuality,
    /// Source of the speed value
    pub speed_source: Option<ValueSource>,
    /// Source of the cadence value
    pub cadence_source: Option<ValueSource>,
}

impl TelemetrySample {
    /// Create an empty low-confidence sample.
    pub fn empty(sequence: u64, timestamp: Instant) -> Self {
        Self {
            sequence,
            timestamp,
            power_watts: 0,
            avg_power_watts: None,
            cadence_rpm: None,
            speed_kmh: None,
            distance_delta_m: None,
            heart_rate_bpm: None,
            low_confidence: true,
            quality: DecodeQuality::Complete,
            speed_source: None,
            cadence_source: None,
        }
    }

    /// Create a sample with the given power, as a device would report it.
    pub fn with_power(sequence: u64, timestamp: Instant, power_watts: i16) -> Self {
        Self {
            power_watts,
            low_confidence: false,
            ..Self::empty(sequence, timestamp)
        }
    }
}
