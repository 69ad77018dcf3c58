//! Unit tests for trainer frame decoding.

use spinlink::sensors::decoder::decode_frame;
use spinlink::sensors::ftms::{CYCLING_POWER_MEASUREMENT_UUID, INDOOR_BIKE_DATA_UUID};
use spinlink::sensors::profile::{FieldLayoutProfile, PowerBounds};
use spinlink::sensors::types::{DecodeQuality, FrameFormat};

fn standard_ibd() -> FieldLayoutProfile {
    FieldLayoutProfile::ftms_indoor_bike()
}

fn kickr_ibd() -> FieldLayoutProfile {
    FieldLayoutProfile::kickr_indoor_bike(PowerBounds::default())
}

#[test]
fn test_parse_indoor_bike_data_minimal() {
    // Flags: 0x0000 (only instantaneous speed present)
    // Speed: 0 km/h
    let data = [0x00, 0x00, 0x00, 0x00];
    let result = decode_frame(&data, &standard_ibd());

    assert_eq!(result.speed_kmh, Some(0.0));
    assert!(result.power_watts.is_none());
    assert!(result.cadence_rpm.is_none());
    assert_eq!(result.quality, DecodeQuality::Complete);
}

#[test]
fn test_parse_indoor_bike_data_with_power() {
    // Flags: 0x0040 (instantaneous power present)
    // Speed: 3000 = 30.00 km/h
    // Power: 250W
    let data = [0x40, 0x00, 0xB8, 0x0B, 0xFA, 0x00];
    let result = decode_frame(&data, &standard_ibd());

    assert!((result.speed_kmh.unwrap() - 30.0).abs() < 0.01);
    assert_eq!(result.power_watts, Some(250));
}

#[test]
fn test_parse_indoor_bike_data_heart_rate_without_speed() {
    // Flags: 0x0201 (more data, heart rate)
    let data = [0x01, 0x02, 0x8C];
    let result = decode_frame(&data, &standard_ibd());

    assert!(result.speed_kmh.is_none());
    assert_eq!(result.heart_rate_bpm, Some(140));
}

#[test]
fn test_kickr_power_from_fixed_offset() {
    // Flags: 0x0044 (cadence + power bits)
    // Bytes 2-3: speed 3000 = 30.00 km/h (under the cadence bit)
    // Bytes 4-5: raw cadence 180 -> halved to 90 RPM (under the power bit)
    // Bytes 6-7: power 250W
    let data = [0x44, 0x00, 0xB8, 0x0B, 0xB4, 0x00, 0xFA, 0x00];
    let result = decode_frame(&data, &kickr_ibd());

    assert_eq!(result.power_watts, Some(250));
    assert!((result.speed_kmh.unwrap() - 30.0).abs() < 0.01);
    assert_eq!(result.cadence_rpm, Some(90.0));
    assert!(!result.power_rejected);
}

#[test]
fn test_kickr_power_bounds_inclusive() {
    // 2000W accepted
    let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xD0, 0x07];
    assert_eq!(decode_frame(&data, &kickr_ibd()).power_watts, Some(2000));

    // 2001W rejected
    let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xD1, 0x07];
    let result = decode_frame(&data, &kickr_ibd());
    assert!(result.power_watts.is_none());
    assert!(result.power_rejected);
}

#[test]
fn test_kickr_rejects_implausible_power() {
    // 5000W at bytes 6-7
    let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x88, 0x13];
    let result = decode_frame(&data, &kickr_ibd());

    assert!(result.power_watts.is_none());
    assert!(result.power_rejected);
}

#[test]
fn test_kickr_short_frame_has_no_power() {
    // Flags: 0x0040, raw cadence 200; too short for bytes 6-7
    let data = [0x40, 0x00, 0xC8, 0x00];
    let result = decode_frame(&data, &kickr_ibd());

    assert!(result.power_watts.is_none());
    assert!(!result.power_rejected);
    assert_eq!(result.cadence_rpm, Some(100.0));
}

#[test]
fn test_kickr_average_cadence_resolution() {
    // Flags: 0x0008, average cadence 8500 * 0.01 = 85 RPM
    let data = [0x08, 0x00, 0x34, 0x21];
    let result = decode_frame(&data, &kickr_ibd());

    assert_eq!(result.avg_cadence_rpm, Some(85.0));
    assert!(result.power_watts.is_none());
}

#[test]
fn test_parse_cycling_power_captured_frame() {
    // Flags 0x0034: torque, wheel and crank revolution data
    let data = [
        0x34, 0x00, 0x22, 0x00, 0x3f, 0x5e, 0xb9, 0xcc, 0x00, 0x00, 0x07, 0x4e, 0xb6, 0xfd, 0x45,
        0x0e,
    ];
    let result = decode_frame(&data, &FieldLayoutProfile::cycling_power());

    assert_eq!(result.power_watts, Some(34));
    let wheel = result.wheel.unwrap();
    assert_eq!(wheel.cumulative_revolutions, 0xccb9);
    assert_eq!(wheel.last_event_time, 0x4e07);
    let crank = result.crank.unwrap();
    assert_eq!(crank.cumulative_revolutions, 0xfdb6);
    assert_eq!(crank.last_event_time, 0x0e45);
    assert_eq!(result.quality, DecodeQuality::Complete);
}

#[test]
fn test_parse_cycling_power_negative_power() {
    // Power is signed: 0xFFF6 = -10W
    let data = [0x00, 0x00, 0xF6, 0xFF];
    let result = decode_frame(&data, &FieldLayoutProfile::cycling_power());
    assert_eq!(result.power_watts, Some(-10));
}

#[test]
fn test_parse_cycling_power_truncated_wheel_block() {
    // Flags 0x0010 declares 6 wheel bytes, only 2 follow power
    let data = [0x10, 0x00, 0x64, 0x00, 0x01, 0x02];
    let result = decode_frame(&data, &FieldLayoutProfile::cycling_power());

    assert_eq!(result.power_watts, Some(100));
    assert!(result.wheel.is_none());
    assert_eq!(result.quality, DecodeQuality::Truncated);
}

#[test]
fn test_empty_frame_is_truncated() {
    let result = decode_frame(&[], &standard_ibd());
    assert_eq!(result.quality, DecodeQuality::Truncated);
    assert!(result.power_watts.is_none());
}

#[test]
fn test_format_from_characteristic() {
    assert_eq!(
        FrameFormat::from_uuid(&INDOOR_BIKE_DATA_UUID),
        Some(FrameFormat::IndoorBikeData)
    );
    assert_eq!(
        FrameFormat::from_uuid(&CYCLING_POWER_MEASUREMENT_UUID),
        Some(FrameFormat::CyclingPower)
    );
}
