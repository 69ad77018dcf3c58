//! Spinlink - Smart Trainer Telemetry
//!
//! Decodes trainer notifications (Cycling Power Measurement and FTMS Indoor
//! Bike Data) into a canonical telemetry stream, fills in missing speed and
//! cadence from revolution counters or a physics model, and drives
//! structured workouts from that stream.

pub mod broadcast;
pub mod metrics;
pub mod physics;
pub mod sensors;
pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use broadcast::Broadcaster;
pub use metrics::summary::SessionSummary;
pub use sensors::pipeline::TelemetryPipeline;
pub use sensors::session::TelemetrySession;
pub use sensors::types::{RawNotification, TelemetrySample};
pub use storage::config::AppConfig;
pub use workouts::engine::WorkoutEngine;
