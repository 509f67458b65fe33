//! Engine discrete-status bitmasks (PGN 127489).
//!
//! Each named alarm condition owns a fixed bit position, ascending from
//! the least significant bit. A condition is active when its
//! notification value carries one of the active-state tokens; anything
//! else, including absence, reads as inactive. Unused high bits of a
//! partially-defined word are reserved and always zero. That is
//! distinct from the whole-word "not available" sentinel used when no
//! status data exists at all for an instance.

use std::time::{Duration, Instant};

use serde_json::Value;

use tidelink_core::{Sample, ValueCache};

/// One named condition and its bit position.
#[derive(Debug, Clone, Copy)]
pub struct StatusBit {
    pub condition: &'static str,
    pub bit: u8,
}

macro_rules! bits {
    ($($cond:expr => $bit:expr),* $(,)?) => {
        &[$(StatusBit { condition: $cond, bit: $bit }),*]
    };
}

/// Bit assignments for Discrete Status 1.
pub static DISCRETE_STATUS_1: &[StatusBit] = bits![
    "checkEngine" => 0,
    "overTemperature" => 1,
    "lowOilPressure" => 2,
    "lowOilLevel" => 3,
    "lowFuelPressure" => 4,
    "lowSystemVoltage" => 5,
    "lowCoolantLevel" => 6,
    "waterFlow" => 7,
    "waterInFuel" => 8,
    "chargeIndicator" => 9,
    "preheatIndicator" => 10,
    "highBoostPressure" => 11,
    "revLimitExceeded" => 12,
    "egrSystem" => 13,
    "throttlePositionSensor" => 14,
    "emergencyStop" => 15,
];

/// Bit assignments for Discrete Status 2.
pub static DISCRETE_STATUS_2: &[StatusBit] = bits![
    "warningLevel1" => 0,
    "warningLevel2" => 1,
    "powerReduction" => 2,
    "maintenanceNeeded" => 3,
    "engineCommError" => 4,
    "subOrSecondaryThrottle" => 5,
    "neutralStartProtect" => 6,
    "engineShuttingDown" => 7,
];

/// Notification path for one engine alarm condition.
pub fn alarm_path(source_id: &str, condition: &str) -> String {
    format!("notifications.propulsion.{source_id}.{condition}")
}

/// Whether a raw notification value denotes an active condition.
///
/// Active tokens: `"alarm"`, `"warn"`, `"alert"`, `"emergency"`,
/// boolean `true`, numeric `1`. A `{ "state": … }` wrapper is
/// unwrapped one level. Everything else is inactive.
pub fn is_active_state(raw: &Value) -> bool {
    match raw {
        Value::String(s) => matches!(s.as_str(), "alarm" | "warn" | "alert" | "emergency"),
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::Object(map) => map.get("state").is_some_and(is_active_state),
        _ => false,
    }
}

/// Normalize a raw notification value to a cacheable sample
/// (1.0 active, 0.0 inactive; `null` clears nothing and stays absent).
pub fn alarm_sample(raw: &Value) -> Sample {
    if raw.is_null() {
        Sample::Absent
    } else {
        Sample::Present(if is_active_state(raw) { 1.0 } else { 0.0 })
    }
}

/// Build one status word from the cache.
///
/// Returns `None` when no condition of the word has a fresh entry;
/// the caller encodes that as the whole-word sentinel or omits the
/// field. Otherwise returns the mask with active bits set and all
/// reserved bits zero.
pub fn read_mask(
    word: &[StatusBit],
    cache: &ValueCache,
    source_id: &str,
    ttl: Duration,
    now: Instant,
) -> Option<u16> {
    let mut mask = 0u16;
    let mut any = false;
    for bit in word {
        if let Some(value) = cache.read(&alarm_path(source_id, bit.condition), ttl, now) {
            any = true;
            if value == 1.0 {
                mask |= 1 << bit.bit;
            }
        }
    }
    any.then_some(mask)
}
