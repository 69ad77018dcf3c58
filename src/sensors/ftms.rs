//! GATT identifiers for the telemetry characteristics a trainer exposes.
//!
//! The transport collaborator subscribes to these characteristics and
//! forwards `(uuid, bytes)` pairs; [`FrameFormat::from_uuid`] tells the
//! pipeline which layout to decode them with.

use crate::sensors::types::{FrameFormat, RawNotification};
use std::time::Instant;
use uuid::Uuid;

/// FTMS Service UUID (0x1826)
pub const FTMS_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1826_0000_1000_8000_0080_5f9b_34fb);

/// Indoor Bike Data Characteristic UUID (0x2AD2)
pub const INDOOR_BIKE_DATA_UUID: Uuid = Uuid::from_u128(0x0000_2ad2_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Power Service UUID (0x1818)
pub const CYCLING_POWER_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_1818_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Power Measurement UUID (0x2A63)
pub const CYCLING_POWER_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a63_0000_1000_8000_0080_5f9b_34fb);

impl FrameFormat {
    /// Map a notifying characteristic to its frame format.
    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        if *uuid == CYCLING_POWER_MEASUREMENT_UUID {
            Some(FrameFormat::CyclingPower)
        } else if *uuid == INDOOR_BIKE_DATA_UUID {
            Some(FrameFormat::IndoorBikeData)
        } else {
            None
        }
    }

    /// Characteristic UUID carrying this format.
    pub fn characteristic_uuid(&self) -> Uuid {
        match self {
            FrameFormat::CyclingPower => CYCLING_POWER_MEASUREMENT_UUID,
            FrameFormat::IndoorBikeData => INDOOR_BIKE_DATA_UUID,
        }
    }

    /// Service UUID the characteristic belongs to.
    pub fn service_uuid(&self) -> Uuid {
        match self {
            FrameFormat::CyclingPower => CYCLING_POWER_SERVICE_UUID,
            FrameFormat::IndoorBikeData => FTMS_SERVICE_UUID,
        }
    }
}

/// Build a notification from a characteristic UUID and its payload.
///
/// Returns `None` for characteristics that carry no telemetry.
pub fn notification_from_characteristic(
    uuid: &Uuid,
    data: &[u8],
    received_at: Instant,
) -> Option<RawNotification> {
    let format = FrameFormat::from_uuid(uuid)?;
    Some(RawNotification::at(format, data, received_at))
}
