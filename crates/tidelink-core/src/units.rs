//! Unit conversion, rounding, and fixed-width clamping.
//!
//! All functions are pure and total over finite inputs. Callers check
//! presence first (see [`crate::sample::Sample`]); none of these are
//! meant to be called with NaN or infinities.

use serde::{Deserialize, Serialize};

/// Round to a fractional resolution expressed as an integer scale.
///
/// Scaling up before rounding (rather than dividing by the step)
/// matches the behavior expected at half-way inputs like 290.15.
fn round_scaled(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

/// Voltage, nearest 0.01 V.
pub fn round_voltage(volts: f64) -> f64 {
    round_scaled(volts, 100.0)
}

/// Current, nearest 0.1 A.
pub fn round_current(amps: f64) -> f64 {
    round_scaled(amps, 10.0)
}

/// Temperature, nearest 0.1 K.
pub fn round_temperature(kelvin: f64) -> f64 {
    round_scaled(kelvin, 10.0)
}

/// Ratio (0..1) to whole percent.
pub fn ratio_to_percent(ratio: f64) -> f64 {
    (ratio * 100.0).round()
}

/// Pascals to kilopascals, nearest 0.1 kPa.
pub fn pascal_to_kilopascal(pa: f64) -> f64 {
    round_scaled(pa / 1000.0, 10.0)
}

/// Volumetric fuel rate, m³/s to L/h, nearest 0.1 L/h.
pub fn cubic_meters_per_second_to_liters_per_hour(rate: f64) -> f64 {
    round_scaled(rate * 3_600_000.0, 10.0)
}

/// Quantize rotational speed to the nearest `step` rpm.
///
/// A step of 1 (or 0) leaves the value at whole-rpm resolution.
pub fn quantize_rpm(rpm: f64, step: u32) -> f64 {
    let step = f64::from(step.max(1));
    (rpm / step).round() * step
}

/// Angular-rate convention of a rotational-speed feed.
///
/// Signal K feeds usually carry rad/s, but some sources report
/// revolutions per second for the same path. The convention is explicit
/// per source and never guessed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AngularUnit {
    /// Radians per second (the Signal K default).
    #[default]
    RadiansPerSecond,
    /// Revolutions per second.
    RevolutionsPerSecond,
}

impl AngularUnit {
    /// Convert an angular rate in this unit to revolutions per minute.
    pub fn to_rpm(self, rate: f64) -> f64 {
        match self {
            AngularUnit::RadiansPerSecond => rate * 60.0 / (2.0 * std::f64::consts::PI),
            AngularUnit::RevolutionsPerSecond => rate * 60.0,
        }
    }
}

/// Saturate a converted magnitude into an unsigned field of `bits` width.
///
/// The all-ones pattern is reserved as the "not available" sentinel, so
/// the largest representable value is `2^bits − 2`. Out-of-range input
/// saturates; it never wraps and never aliases the sentinel.
pub fn clamp_unsigned(value: f64, bits: u32) -> u64 {
    let max = field_max(bits);
    if value <= 0.0 {
        0
    } else if value >= max as f64 {
        max
    } else {
        value.round() as u64
    }
}

/// Largest representable value of an unsigned field of `bits` width
/// (all-ones is reserved for "not available").
pub fn field_max(bits: u32) -> u64 {
    debug_assert!((1..=63).contains(&bits));
    (1u64 << bits) - 2
}

/// The "not available" sentinel for an unsigned field of `bits` width:
/// all ones.
pub fn not_available(bits: u32) -> u64 {
    debug_assert!((1..=63).contains(&bits));
    (1u64 << bits) - 1
}

/// Saturate a converted magnitude into a signed field of `bits` width.
///
/// The maximum positive pattern (`2^(bits−1) − 1`) is reserved as the
/// "not available" sentinel, so the representable range is
/// `[−(2^(bits−1) − 2), 2^(bits−1) − 2]`.
pub fn clamp_signed(value: f64, bits: u32) -> i64 {
    let max = signed_field_max(bits);
    let min = -max;
    if value <= min as f64 {
        min
    } else if value >= max as f64 {
        max
    } else {
        value.round() as i64
    }
}

/// Largest representable magnitude of a signed field of `bits` width.
pub fn signed_field_max(bits: u32) -> i64 {
    debug_assert!((2..=63).contains(&bits));
    (1i64 << (bits - 1)) - 2
}

/// The "not available" sentinel for a signed field of `bits` width:
/// the maximum positive pattern (e.g. `0x7FFF` for 16 bits).
pub fn not_available_signed(bits: u32) -> i64 {
    debug_assert!((2..=63).contains(&bits));
    (1i64 << (bits - 1)) - 1
}

/// A duration broken into whole hours, minutes, and seconds.
///
/// Components are floored, not rounded: 3661.9 s is 1 h 1 m 1 s. There
/// is no sub-second precision anywhere in the protocol records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineHours {
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
}

impl EngineHours {
    /// Split a duration in seconds into h/m/s components.
    ///
    /// Negative input clamps to zero.
    pub fn from_seconds(seconds: f64) -> Self {
        let total = seconds.max(0.0).floor() as u64;
        Self {
            hours: (total / 3600) as u32,
            minutes: ((total % 3600) / 60) as u8,
            seconds: (total % 60) as u8,
        }
    }

    /// Total whole seconds.
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    /// ISO 8601 duration of the form `PT3H25M40S`.
    pub fn to_iso8601(&self) -> String {
        format!("PT{}H{}M{}S", self.hours, self.minutes, self.seconds)
    }
}

impl std::fmt::Display for EngineHours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}
