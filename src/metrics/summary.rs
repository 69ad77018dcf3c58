//! Ride summary aggregation.
//!
//! Folds the sample stream of one session into totals and averages.

use crate::sensors::types::{DecodeQuality, TelemetrySample};
use crate::workouts::types::{CoachingHint, Guidance};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Gaps longer than this are not integrated (e.g. a reconnect).
const MAX_INTEGRATION_GAP: Duration = Duration::from_secs(5);

/// Totals for one telemetry session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Samples seen
    pub samples: u64,
    /// Samples without a usable power value
    pub low_confidence_samples: u64,
    /// Samples decoded from truncated frames
    pub truncated_samples: u64,
    /// Time between the first and last sample in seconds
    pub duration_seconds: f64,
    /// Mean power over samples with a power value
    pub avg_power_watts: Option<f32>,
    /// Highest reported power
    pub max_power_watts: Option<i16>,
    /// Mean cadence over samples with a cadence value
    pub avg_cadence_rpm: Option<f32>,
    /// Highest speed in km/h
    pub max_speed_kmh: Option<f32>,
    /// Mean heart rate
    pub avg_heart_rate_bpm: Option<f32>,
    /// Distance covered in meters
    pub distance_m: f64,
    /// Mechanical work in kilojoules
    pub energy_kj: f64,
    /// Interval guidance samples
    pub interval_samples: u64,
    /// Interval guidance samples within the target band
    pub on_target_samples: u64,
}

impl SessionSummary {
    /// Share of interval samples on target, 0 to 100.
    pub fn on_target_percent(&self) -> Option<f32> {
        if self.interval_samples == 0 {
            return None;
        }
        Some(self.on_target_samples as f32 * 100.0 / self.interval_samples as f32)
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Samples:        {}", self.samples)?;
        writeln!(
            f,
            "  low conf.:    {} ({} truncated)",
            self.low_confidence_samples, self.truncated_samples
        )?;
        writeln!(f, "Duration:       {:.0}s", self.duration_seconds)?;
        match (self.avg_power_watts, self.max_power_watts) {
            (Some(avg), Some(max)) => writeln!(f, "Power:          avg {:.0}W, max {}W", avg, max)?,
            _ => writeln!(f, "Power:          -")?,
        }
        if let Some(cadence) = self.avg_cadence_rpm {
            writeln!(f, "Cadence:        avg {:.0} rpm", cadence)?;
        }
        if let Some(hr) = self.avg_heart_rate_bpm {
            writeln!(f, "Heart rate:     avg {:.0} bpm", hr)?;
        }
        writeln!(f, "Distance:       {:.2} km", self.distance_km())?;
        write!(f, "Energy:         {:.1} kJ", self.energy_kj)?;
        if let Some(pct) = self.on_target_percent() {
            write!(f, "\nOn target:      {:.0}%", pct)?;
        }
        Ok(())
    }
}

/// Running aggregation over a sample stream.
#[derive(Debug, Default)]
pub struct SummaryAccumulator {
    summary: SessionSummary,
    first_at: Option<Instant>,
    last_at: Option<Instant>,
    power_sum: f64,
    power_count: u64,
    cadence_sum: f64,
    cadence_count: u64,
    hr_sum: f64,
    hr_count: u64,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample.
    pub fn record(&mut self, sample: &TelemetrySample) {
        let s = &mut self.summary;
        s.samples += 1;
        if sample.low_confidence {
            s.low_confidence_samples += 1;
        }
        if sample.quality == DecodeQuality::Truncated {
            s.truncated_samples += 1;
        }

        let dt = self
            .last_at
            .map(|prev| sample.timestamp.saturating_duration_since(prev))
            .filter(|gap| *gap <= MAX_INTEGRATION_GAP)
            .map_or(0.0, |gap| gap.as_secs_f64());

        if !sample.low_confidence {
            let power = sample.power_watts;
            self.power_sum += f64::from(power);
            self.power_count += 1;
            s.max_power_watts = Some(s.max_power_watts.map_or(power, |m| m.max(power)));
            if power > 0 {
                s.energy_kj += f64::from(power) * dt / 1000.0;
            }
        }

        if let Some(cadence) = sample.cadence_rpm {
            self.cadence_sum += f64::from(cadence);
            self.cadence_count += 1;
        }
        if let Some(hr) = sample.heart_rate_bpm {
            self.hr_sum += f64::from(hr);
            self.hr_count += 1;
        }
        if let Some(speed) = sample.speed_kmh {
            s.max_speed_kmh = Some(s.max_speed_kmh.map_or(speed, |m| m.max(speed)));
        }

        match sample.distance_delta_m {
            Some(delta) => s.distance_m += f64::from(delta),
            None => {
                if let Some(speed) = sample.speed_kmh {
                    s.distance_m += f64::from(speed) / 3.6 * dt;
                }
            }
        }

        self.first_at.get_or_insert(sample.timestamp);
        self.last_at = Some(sample.timestamp);
    }

    /// Fold one guidance output.
    pub fn record_guidance(&mut self, guidance: &Guidance) {
        if let Some(hint) = guidance.hint {
            self.summary.interval_samples += 1;
            if hint == CoachingHint::OnTarget {
                self.summary.on_target_samples += 1;
            }
        }
    }

    /// Summary so far.
    pub fn summary(&self) -> SessionSummary {
        let mut summary = self.summary.clone();
        summary.avg_power_watts = mean(self.power_sum, self.power_count);
        summary.avg_cadence_rpm = mean(self.cadence_sum, self.cadence_count);
        summary.avg_heart_rate_bpm = mean(self.hr_sum, self.hr_count);
        if let (Some(first), Some(last)) = (self.first_at, self.last_at) {
            summary.duration_seconds = last.saturating_duration_since(first).as_secs_f64();
        }
        summary
    }

    pub fn finish(self) -> SessionSummary {
        self.summary()
    }
}

fn mean(sum: f64, count: u64) -> Option<f32> {
    (count > 0).then(|| (sum / count as f64) as f32)
}
