//! Estimates used when the trainer does not report speed or cadence.

pub mod cadence;
pub mod speed;

pub use cadence::CadenceEstimator;
pub use speed::{PhysicsParameters, SharedPhysics, SpeedPhysicsModel, SpeedSolution};
