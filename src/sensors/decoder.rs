//! Profile-driven telemetry frame decoder.
//!
//! The decoder walks the profile's field table in wire order, consuming each
//! flag-declared field and advancing a running offset. It never fails: a field
//! that runs past the end of the payload is left absent and the result is
//! marked [`DecodeQuality::Truncated`].

use crate::sensors::profile::{FieldId, FieldLayoutProfile, FieldSpec};
use crate::sensors::types::{
    CrankRevolutionData, DecodeQuality, DecodedFields, RawNotification, WheelRevolutionData,
};

/// Length of the flags word at the start of every frame.
const FLAGS_LEN: usize = 2;

/// Stateless decoder for both telemetry formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    /// Decode one notification using the given layout.
    pub fn decode(raw: &RawNotification, profile: &FieldLayoutProfile) -> DecodedFields {
        if raw.format != profile.format {
            tracing::warn!(
                "Decoding {} frame with {} profile {}",
                raw.format,
                profile.format,
                profile.qualified_name()
            );
        }
        decode_frame(&raw.data, profile)
    }
}

/// Decode a raw payload using the given layout.
pub fn decode_frame(data: &[u8], profile: &FieldLayoutProfile) -> DecodedFields {
    let mut result = DecodedFields::default();

    if data.len() < FLAGS_LEN {
        tracing::debug!("Frame too short for flags: {} bytes", data.len());
        result.quality = DecodeQuality::Truncated;
        return result;
    }

    let flags = u16::from_le_bytes([data[0], data[1]]);
    result.flags = flags;

    let mut offset = FLAGS_LEN;
    for spec in profile.fields.iter().filter(|s| s.presence.is_present(flags)) {
        match data.get(offset..offset + spec.width) {
            Some(bytes) => apply_field(&mut result, spec, bytes),
            None => {
                tracing::debug!(
                    "Truncated {:?} at offset {} (need {} bytes, have {})",
                    spec.field,
                    offset,
                    spec.width,
                    data.len().saturating_sub(offset)
                );
                result.quality = DecodeQuality::Truncated;
            }
        }
        offset += spec.width;
    }

    if let Some(rule) = profile.power_override {
        result.power_watts = match read_u16(data, rule.offset) {
            Some(candidate) => {
                let accepted = if rule.bounds.contains(i32::from(candidate)) {
                    i16::try_from(candidate).ok()
                } else {
                    None
                };
                if accepted.is_none() {
                    tracing::debug!(
                        "Rejected power candidate {}W at offset {} (bounds {}..={})",
                        candidate,
                        rule.offset,
                        rule.bounds.min_watts,
                        rule.bounds.max_watts
                    );
                    result.power_rejected = true;
                }
                accepted
            }
            // Too short to reach the fixed offset: no power reading
            None => None,
        };
    }

    if let Some(correction) = profile.cadence_correction {
        result.cadence_rpm = result.cadence_rpm.map(|c| c * correction);
    }

    result
}

/// Store one fully-read field into the result.
fn apply_field(result: &mut DecodedFields, spec: &FieldSpec, bytes: &[u8]) {
    let scaled = |raw: u32| raw as f32 * spec.scale;

    match spec.field {
        FieldId::InstantaneousSpeed => result.speed_kmh = Some(scaled(read_unsigned(bytes))),
        FieldId::AverageSpeed => result.avg_speed_kmh = Some(scaled(read_unsigned(bytes))),
        FieldId::InstantaneousCadence => result.cadence_rpm = Some(scaled(read_unsigned(bytes))),
        FieldId::AverageCadence => result.avg_cadence_rpm = Some(scaled(read_unsigned(bytes))),
        FieldId::TotalDistance => result.total_distance_m = Some(read_unsigned(bytes)),
        FieldId::ResistanceLevel => result.resistance_level = Some(read_signed_i16(bytes)),
        FieldId::InstantaneousPower => result.power_watts = Some(read_signed_i16(bytes)),
        FieldId::AveragePower => result.avg_power_watts = Some(read_signed_i16(bytes)),
        FieldId::TotalEnergy => result.total_energy_kcal = Some(read_unsigned(bytes) as u16),
        FieldId::EnergyPerHour => result.energy_per_hour_kcal = Some(read_unsigned(bytes) as u16),
        FieldId::EnergyPerMinute => result.energy_per_minute_kcal = Some(bytes[0]),
        FieldId::HeartRate => result.heart_rate_bpm = Some(bytes[0]),
        FieldId::MetabolicEquivalent => {
            result.metabolic_equivalent = Some(scaled(read_unsigned(bytes)))
        }
        FieldId::ElapsedTime => result.elapsed_time_s = Some(read_unsigned(bytes) as u16),
        FieldId::RemainingTime => result.remaining_time_s = Some(read_unsigned(bytes) as u16),
        FieldId::PedalPowerBalance => {
            result.pedal_power_balance_pct = Some(scaled(read_unsigned(bytes)))
        }
        FieldId::AccumulatedTorque => {
            result.accumulated_torque_nm = Some(scaled(read_unsigned(bytes)))
        }
        FieldId::AccumulatedEnergy => {
            result.accumulated_energy_kj = Some(read_unsigned(bytes) as u16)
        }
        FieldId::WheelRevolutions => {
            if bytes.len() >= 6 {
                result.wheel = Some(WheelRevolutionData {
                    cumulative_revolutions: u32::from_le_bytes([
                        bytes[0], bytes[1], bytes[2], bytes[3],
                    ]),
                    last_event_time: u16::from_le_bytes([bytes[4], bytes[5]]),
                });
            }
        }
        FieldId::CrankRevolutions => {
            if bytes.len() >= 4 {
                result.crank = Some(CrankRevolutionData {
                    cumulative_revolutions: u16::from_le_bytes([bytes[0], bytes[1]]),
                    last_event_time: u16::from_le_bytes([bytes[2], bytes[3]]),
                });
            }
        }
        // Consumed for offset tracking only
        FieldId::ExtremeForceMagnitudes
        | FieldId::ExtremeTorqueMagnitudes
        | FieldId::ExtremeAngles
        | FieldId::TopDeadSpotAngle
        | FieldId::BottomDeadSpotAngle => {}
    }
}

/// Little-endian unsigned integer of up to four bytes.
fn read_unsigned(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .enumerate()
        .fold(0u32, |acc, (i, b)| acc | (u32::from(*b) << (8 * i)))
}

/// Little-endian signed 16-bit value; single bytes are sign-extended.
fn read_signed_i16(bytes: &[u8]) -> i16 {
    match bytes {
        [lo, hi, ..] => i16::from_le_bytes([*lo, *hi]),
        [b] => i16::from(*b as i8),
        [] => 0,
    }
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}
