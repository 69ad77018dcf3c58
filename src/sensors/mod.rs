//! Sensor module: trainer notification decoding and the telemetry pipeline.

pub mod capture;
pub mod decoder;
pub mod ftms;
pub mod integrator;
pub mod pipeline;
pub mod profile;
pub mod session;
pub mod types;

pub use capture::{read_capture, CaptureError, CapturedFrame};
pub use decoder::FrameDecoder;
pub use integrator::{RevolutionDeltas, WheelCrankIntegrator, DEFAULT_WHEEL_CIRCUMFERENCE_M};
pub use pipeline::{PipelineStats, TelemetryPipeline};
pub use profile::{
    DeviceProfile, FieldLayoutProfile, PowerBounds, ProfileError, KICKR_PROFILE, STANDARD_PROFILE,
};
pub use session::{SessionError, SessionHandle, TelemetrySession};
pub use types::{
    DecodeQuality, DecodedFields, FrameFormat, RawNotification, TelemetrySample, ValueSource,
};
