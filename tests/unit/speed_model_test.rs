//! Unit tests for the power-to-speed model.

use spinlink::physics::{PhysicsParameters, SharedPhysics, SpeedPhysicsModel};
use spinlink::sensors::pipeline::TelemetryPipeline;
use spinlink::sensors::profile::DeviceProfile;
use spinlink::sensors::types::{FrameFormat, RawNotification};

#[test]
fn test_speed_increases_with_power() {
    let params = PhysicsParameters::default();
    let mut previous = 0.0;
    for power in [50.0, 100.0, 200.0, 300.0, 500.0, 1000.0] {
        let speed = SpeedPhysicsModel::estimate_speed_kmh(power, &params);
        assert!(speed > previous, "{}W gave {} km/h", power, speed);
        previous = speed;
    }
}

#[test]
fn test_solver_stays_within_iteration_limit() {
    for gradient in [-5.0, 0.0, 2.0, 8.0, 15.0] {
        let params = PhysicsParameters {
            gradient_percent: gradient,
            ..Default::default()
        };
        for power in [10.0, 150.0, 400.0, 1500.0] {
            let solution = SpeedPhysicsModel::solve(power, &params);
            assert!(solution.iterations <= 10);
            assert!(solution.speed_mps.is_finite());
            assert!(solution.speed_mps >= 0.0);
        }
    }
}

#[test]
fn test_flat_solution_converges() {
    let params = PhysicsParameters::default();
    for power in [100.0, 250.0, 600.0] {
        assert!(SpeedPhysicsModel::solve(power, &params).converged);
    }
}

#[test]
fn test_heavier_rider_slower_uphill() {
    let light = PhysicsParameters {
        rider_mass_kg: 60.0,
        gradient_percent: 6.0,
        ..Default::default()
    };
    let heavy = PhysicsParameters {
        rider_mass_kg: 95.0,
        ..light
    };
    let light_speed = SpeedPhysicsModel::estimate_speed_kmh(250.0, &light);
    let heavy_speed = SpeedPhysicsModel::estimate_speed_kmh(250.0, &heavy);
    assert!(heavy_speed < light_speed);
}

#[test]
fn test_gradient_change_applies_to_next_frame() {
    let physics = SharedPhysics::default();
    let mut pipeline =
        TelemetryPipeline::new(DeviceProfile::standard(), 2.1, physics.clone());
    // Power-only cycling power frame, 250W
    let frame = RawNotification::new(FrameFormat::CyclingPower, [0x00, 0x00, 0xFA, 0x00]);

    let flat = pipeline.process(&frame).speed_kmh.unwrap();
    physics.set_gradient(8.0);
    let climbing = pipeline.process(&frame).speed_kmh.unwrap();

    assert!(climbing < flat);
}

#[test]
fn test_shared_physics_clamps() {
    let physics = SharedPhysics::default();
    physics.set_gradient(80.0);
    physics.set_rider_mass(10.0);
    let params = physics.snapshot();
    assert_eq!(params.gradient_percent, 50.0);
    assert_eq!(params.rider_mass_kg, 30.0);
}

#[test]
fn test_steep_descent_gives_nudged_speed() {
    let params = PhysicsParameters {
        gradient_percent: -10.0,
        ..Default::default()
    };
    let solution = SpeedPhysicsModel::solve(200.0, &params);

    assert!(!solution.converged);
    assert_eq!(solution.iterations, 1);
    assert!((SpeedPhysicsModel::estimate_speed_kmh(200.0, &params) - 0.36).abs() < 1e-4);
}
