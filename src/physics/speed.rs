//! Power-to-speed model.
//!
//! Estimates road speed from power when the trainer reports neither speed
//! nor wheel revolutions, using a steady-state balance of rolling
//! resistance, gravity and aerodynamic drag.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Physics constants
const AIR_DENSITY: f32 = 1.225; // kg/m³ at sea level
const GRAVITY: f32 = 9.8067; // m/s²
const DEFAULT_CDA: f32 = 0.25; // m²
const DEFAULT_CRR: f32 = 0.004; // Rolling resistance for road tires
const BIKE_MASS: f32 = 8.0; // kg

/// Solver limits
const MAX_ITERATIONS: u32 = 10;
const TOLERANCE_MPS: f32 = 0.01;
const NUDGE_MPS: f32 = 0.1;

/// Rider/bike/road parameters read by the model on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParameters {
    /// Rider mass in kilograms
    pub rider_mass_kg: f32,
    /// Bike mass in kilograms
    pub bike_mass_kg: f32,
    /// Rolling resistance coefficient
    pub crr: f32,
    /// Drag coefficient times frontal area (CdA)
    pub cda: f32,
    /// Road gradient in percent
    pub gradient_percent: f32,
}

impl Default for PhysicsParameters {
    fn default() -> Self {
        Self {
            rider_mass_kg: 75.0,
            bike_mass_kg: BIKE_MASS,
            crr: DEFAULT_CRR,
            cda: DEFAULT_CDA,
            gradient_percent: 0.0,
        }
    }
}

impl PhysicsParameters {
    /// Total system mass (rider + bike)
    pub fn total_mass(&self) -> f32 {
        self.rider_mass_kg + self.bike_mass_kg
    }
}

/// Physics parameters shared between the control surface and the pipeline.
///
/// Writers update individual values between samples; the pipeline takes one
/// snapshot per frame so a computation never sees a half-applied change.
#[derive(Debug, Clone, Default)]
pub struct SharedPhysics {
    inner: Arc<RwLock<PhysicsParameters>>,
}

impl SharedPhysics {
    pub fn new(params: PhysicsParameters) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    /// Copy of the current parameters.
    pub fn snapshot(&self) -> PhysicsParameters {
        match self.inner.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Apply a change to the parameters.
    pub fn update(&self, f: impl FnOnce(&mut PhysicsParameters)) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }

    pub fn set_gradient(&self, gradient_percent: f32) {
        self.update(|p| p.gradient_percent = gradient_percent.clamp(-50.0, 50.0));
        tracing::debug!("Gradient set to {}%", gradient_percent);
    }

    /// Update rider mass (e.g., from settings change)
    pub fn set_rider_mass(&self, mass_kg: f32) {
        self.update(|p| p.rider_mass_kg = mass_kg.clamp(30.0, 200.0));
        tracing::debug!("Rider mass set to {} kg", mass_kg);
    }

    pub fn set_bike_mass(&self, mass_kg: f32) {
        self.update(|p| p.bike_mass_kg = mass_kg.max(0.0));
    }
}

/// Result of one speed solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSolution {
    /// Speed in meters per second
    pub speed_mps: f32,
    /// Iterations performed
    pub iterations: u32,
    /// Whether the step size dropped below tolerance
    pub converged: bool,
}

impl SpeedSolution {
    pub fn speed_kmh(&self) -> f32 {
        self.speed_mps * 3.6
    }

    fn stopped() -> Self {
        Self {
            speed_mps: 0.0,
            iterations: 0,
            converged: true,
        }
    }
}

/// Steady-state power/speed model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedPhysicsModel;

impl SpeedPhysicsModel {
    /// Estimated speed in km/h; 0 for power ≤ 0.
    pub fn estimate_speed_kmh(power_watts: f32, params: &PhysicsParameters) -> f32 {
        Self::solve(power_watts, params).speed_kmh()
    }

    /// Solve `P = v * (F_roll + F_grav + F_drag(v))` for `v`.
    ///
    /// Iteration starts at `v = 0`, where the step is the plain fixed-point
    /// update `P / F(0)`. Later steps apply a Newton correction to the power
    /// balance, bounded above by the drag-only speed, which keeps the solve
    /// well inside the iteration limit. If the net resisting force is not
    /// positive the velocity is nudged up once and returned unconverged
    /// instead of dividing.
    pub fn solve(power_watts: f32, params: &PhysicsParameters) -> SpeedSolution {
        if !power_watts.is_finite() || power_watts <= 0.0 {
            return SpeedSolution::stopped();
        }

        let power = power_watts;
        let mass = params.total_mass();

        // Convert percentage to the road angle
        let angle = (params.gradient_percent / 100.0).atan();
        let f_rolling = params.crr * mass * GRAVITY * angle.cos();
        let f_gravity = mass * GRAVITY * angle.sin();
        let f_static = f_rolling + f_gravity;
        let drag_coeff = 0.5 * params.cda * AIR_DENSITY;

        // With a positive static load the drag-only speed bounds the root
        let upper_bound = if f_static > 0.0 && drag_coeff > 0.0 {
            Some((power / drag_coeff).cbrt())
        } else {
            None
        };

        let mut v = 0.0f32;
        for iteration in 1..=MAX_ITERATIONS {
            let f_total = f_static + drag_coeff * v * v;

            if f_total <= 0.0 {
                // Gravity outweighs the resisting forces: nudge once and stop
                return SpeedSolution {
                    speed_mps: v + NUDGE_MPS,
                    iterations: iteration,
                    converged: false,
                };
            }

            let mut v_new = if v == 0.0 {
                power / f_total
            } else {
                // f(v) = v * F(v) - P, f'(v) = F_static + 3 * k * v^2
                let slope = f_static + 3.0 * drag_coeff * v * v;
                if slope > 0.0 {
                    v - (v * f_total - power) / slope
                } else {
                    power / f_total
                }
            };

            v_new = v_new.max(0.0);
            if let Some(bound) = upper_bound {
                v_new = v_new.min(bound);
            }

            if !v_new.is_finite() {
                tracing::warn!("Speed solver diverged at {}W", power_watts);
                return SpeedSolution {
                    speed_mps: v.max(0.0),
                    iterations: iteration,
                    converged: false,
                };
            }

            if (v_new - v).abs() < TOLERANCE_MPS {
                return SpeedSolution {
                    speed_mps: v_new,
                    iterations: iteration,
                    converged: true,
                };
            }

            v = v_new;
        }

        SpeedSolution {
            speed_mps: v.max(0.0),
            iterations: MAX_ITERATIONS,
            converged: false,
        }
    }
}
