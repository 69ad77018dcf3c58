//! Cadence estimate for trainers that report power only.

/// Step function from power to an assumed cadence.
#[derive(Debug, Clone, Copy, Default)]
pub struct CadenceEstimator;

impl CadenceEstimator {
    /// Assumed cadence in RPM for the given power.
    pub fn estimate_rpm(power_watts: i32) -> u16 {
        match power_watts {
            i32::MIN..=0 => 0,
            1..=49 => 60,
            50..=99 => 70,
            100..=149 => 80,
            150..=199 => 85,
            _ => 90,
        }
    }
}
