//! Message kinds, field schemas, and composed records.
//!
//! Each message kind mirrors one NMEA 2000 PGN with a fixed field
//! schema, mandated cadence, and default staleness window. Field specs
//! carry both naming conventions (canboat display name and lowerCamel
//! wire name), the encoded bit width, the fixed-point resolution, and
//! the scaling back to SI base units for the wire convention.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use tidelink_core::units::{self, EngineHours};
use tidelink_core::DeviceKind;

/// A category of output record: one PGN, one field schema, one cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    /// PGN 127488: Engine Parameters, Rapid Update.
    EngineRapid,
    /// PGN 127489: Engine Parameters, Dynamic.
    EngineDynamic,
    /// PGN 127506: DC Detailed Status.
    DcDetailed,
    /// PGN 127508: Battery Status.
    BatteryStatus,
    /// PGN 130312: Temperature.
    Temperature,
}

impl MessageKind {
    /// All message kinds.
    pub const ALL: [MessageKind; 5] = [
        MessageKind::EngineRapid,
        MessageKind::EngineDynamic,
        MessageKind::DcDetailed,
        MessageKind::BatteryStatus,
        MessageKind::Temperature,
    ];

    /// Kinds emitted for one device kind.
    pub fn for_device(kind: DeviceKind) -> &'static [MessageKind] {
        match kind {
            DeviceKind::Battery => &[
                MessageKind::BatteryStatus,
                MessageKind::DcDetailed,
                MessageKind::Temperature,
            ],
            DeviceKind::Engine => &[MessageKind::EngineRapid, MessageKind::EngineDynamic],
        }
    }

    /// The PGN this kind maps to.
    pub fn pgn(self) -> u32 {
        match self {
            MessageKind::EngineRapid => 127_488,
            MessageKind::EngineDynamic => 127_489,
            MessageKind::DcDetailed => 127_506,
            MessageKind::BatteryStatus => 127_508,
            MessageKind::Temperature => 130_312,
        }
    }

    /// Default bus priority for the wire convention.
    pub fn priority(self) -> u8 {
        match self {
            MessageKind::EngineRapid | MessageKind::EngineDynamic => 2,
            MessageKind::DcDetailed | MessageKind::BatteryStatus => 6,
            MessageKind::Temperature => 5,
        }
    }

    /// Mandated emission interval.
    pub fn default_interval(self) -> Duration {
        match self {
            MessageKind::EngineRapid => Duration::from_millis(250),
            MessageKind::EngineDynamic
            | MessageKind::DcDetailed
            | MessageKind::BatteryStatus => Duration::from_millis(1000),
            MessageKind::Temperature => Duration::from_millis(2000),
        }
    }

    /// Default staleness window for this kind's source values.
    pub fn default_ttl(self) -> Duration {
        match self {
            MessageKind::EngineRapid => Duration::from_secs(1),
            MessageKind::EngineDynamic => Duration::from_secs(5),
            MessageKind::DcDetailed
            | MessageKind::BatteryStatus
            | MessageKind::Temperature => Duration::from_secs(60),
        }
    }

    /// The device kind this message kind is emitted for.
    pub fn device_kind(self) -> DeviceKind {
        match self {
            MessageKind::EngineRapid | MessageKind::EngineDynamic => DeviceKind::Engine,
            _ => DeviceKind::Battery,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageKind::EngineRapid => "Engine Parameters, Rapid Update",
            MessageKind::EngineDynamic => "Engine Parameters, Dynamic",
            MessageKind::DcDetailed => "DC Detailed Status",
            MessageKind::BatteryStatus => "Battery Status",
            MessageKind::Temperature => "Temperature",
        };
        write!(f, "{} ({})", name, self.pgn())
    }
}

/// How an absent field is encoded in the output record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingFieldPolicy {
    /// Leave absent fields out of the record entirely.
    #[default]
    Omit,
    /// Always include every field; absent ones carry the
    /// width-appropriate "not available" sentinel.
    Sentinel,
}

/// Field naming and unit convention of rendered records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldConvention {
    /// Human-readable field names, display units, ISO 8601 durations.
    #[default]
    Named,
    /// lowerCamel field names, SI base units, `prio`/`dst` metadata.
    Wire,
}

/// Scaling from a field's display unit back to its SI base unit, used
/// by the wire convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireScale {
    Identity,
    /// Percent → ratio 0..1.
    PercentToRatio,
    /// kPa → Pa.
    KilopascalToPascal,
    /// L/h → m³/s.
    LitersPerHourToCubicMetersPerSecond,
}

impl WireScale {
    fn apply(self, value: f64) -> f64 {
        match self {
            WireScale::Identity => value,
            WireScale::PercentToRatio => value / 100.0,
            WireScale::KilopascalToPascal => value * 1000.0,
            WireScale::LitersPerHourToCubicMetersPerSecond => value / 3_600_000.0,
        }
    }
}

/// Static schema of one field within a message kind.
#[derive(Debug)]
pub struct FieldSpec {
    /// Display name (canboat convention).
    pub name: &'static str,
    /// lowerCamel wire name.
    pub wire: &'static str,
    /// Encoded width in bits.
    pub bits: u32,
    /// Whether the encoded field is signed.
    pub signed: bool,
    /// Fixed-point resolution in the display unit.
    pub resolution: f64,
    /// Scaling back to SI for the wire convention.
    pub wire_scale: WireScale,
}

impl FieldSpec {
    /// Saturate a display-unit value into this field's representable
    /// range. In-range values pass through unchanged (callers round to
    /// the field's resolution first); out-of-range values saturate to
    /// the boundary, never wrap, and never alias the sentinel.
    pub fn clamp(&self, value: f64) -> f64 {
        let raw = value / self.resolution;
        if self.signed {
            let max = units::signed_field_max(self.bits) as f64;
            if raw > max {
                max * self.resolution
            } else if raw < -max {
                -max * self.resolution
            } else {
                value
            }
        } else {
            let max = units::field_max(self.bits) as f64;
            if raw > max {
                max * self.resolution
            } else if raw < 0.0 {
                0.0
            } else {
                value
            }
        }
    }

    /// The raw "not available" pattern for this field's width.
    pub fn sentinel(&self) -> Value {
        if self.signed {
            json!(units::not_available_signed(self.bits))
        } else {
            json!(units::not_available(self.bits))
        }
    }
}

/// Field specs for every message kind.
pub mod fields {
    use super::{FieldSpec, WireScale};

    macro_rules! spec {
        ($id:ident, $name:expr, $wire:expr, $bits:expr, $signed:expr, $res:expr, $scale:expr) => {
            pub static $id: FieldSpec = FieldSpec {
                name: $name,
                wire: $wire,
                bits: $bits,
                signed: $signed,
                resolution: $res,
                wire_scale: $scale,
            };
        };
    }

    // 127508 Battery Status
    spec!(BATTERY_INSTANCE, "Battery Instance", "batteryInstance", 8, false, 1.0, WireScale::Identity);
    spec!(VOLTAGE, "Voltage", "voltage", 16, false, 0.01, WireScale::Identity);
    spec!(CURRENT, "Current", "current", 16, true, 0.1, WireScale::Identity);
    spec!(BATTERY_TEMPERATURE, "Temperature", "temperature", 16, false, 0.1, WireScale::Identity);

    // 127506 DC Detailed Status
    spec!(DC_INSTANCE, "DC Instance", "dcInstance", 8, false, 1.0, WireScale::Identity);
    spec!(DC_TYPE, "DC Type", "dcType", 8, false, 1.0, WireScale::Identity);
    spec!(STATE_OF_CHARGE, "State of Charge", "stateOfCharge", 8, false, 1.0, WireScale::PercentToRatio);
    spec!(STATE_OF_HEALTH, "State of Health", "stateOfHealth", 8, false, 1.0, WireScale::PercentToRatio);
    spec!(TIME_REMAINING, "Time Remaining", "timeRemaining", 16, false, 1.0, WireScale::Identity);
    spec!(RIPPLE_VOLTAGE, "Ripple Voltage", "rippleVoltage", 16, false, 0.01, WireScale::Identity);
    spec!(AMP_HOURS, "Amp Hours", "ampHours", 16, false, 1.0, WireScale::Identity);

    // 127488 Engine Parameters, Rapid Update
    spec!(ENGINE_INSTANCE, "Engine Instance", "engineInstance", 8, false, 1.0, WireScale::Identity);
    spec!(SPEED, "Speed", "speed", 16, false, 1.0, WireScale::Identity);

    // 127489 Engine Parameters, Dynamic
    spec!(OIL_PRESSURE, "Oil pressure", "oilPressure", 16, false, 0.1, WireScale::KilopascalToPascal);
    spec!(OIL_TEMPERATURE, "Oil temperature", "oilTemperature", 16, false, 0.1, WireScale::Identity);
    spec!(COOLANT_TEMPERATURE, "Temperature", "temperature", 16, false, 0.1, WireScale::Identity);
    spec!(ALTERNATOR_POTENTIAL, "Alternator Potential", "alternatorPotential", 16, false, 0.01, WireScale::Identity);
    spec!(FUEL_RATE, "Fuel Rate", "fuelRate", 16, false, 0.1, WireScale::LitersPerHourToCubicMetersPerSecond);
    spec!(TOTAL_ENGINE_HOURS, "Total Engine hours", "totalEngineHours", 32, false, 1.0, WireScale::Identity);
    spec!(COOLANT_PRESSURE, "Coolant Pressure", "coolantPressure", 16, false, 0.1, WireScale::KilopascalToPascal);
    spec!(FUEL_PRESSURE, "Fuel Pressure", "fuelPressure", 16, false, 0.1, WireScale::KilopascalToPascal);
    spec!(DISCRETE_STATUS_1, "Discrete Status 1", "discreteStatus1", 16, false, 1.0, WireScale::Identity);
    spec!(DISCRETE_STATUS_2, "Discrete Status 2", "discreteStatus2", 16, false, 1.0, WireScale::Identity);
    spec!(ENGINE_LOAD, "Engine Load", "engineLoad", 8, false, 1.0, WireScale::PercentToRatio);
    spec!(ENGINE_TORQUE, "Engine Torque", "engineTorque", 8, false, 1.0, WireScale::PercentToRatio);

    // 130312 Temperature
    spec!(TEMP_INSTANCE, "Instance", "instance", 8, false, 1.0, WireScale::Identity);
    spec!(TEMP_SOURCE, "Source", "source", 8, false, 1.0, WireScale::Identity);
    spec!(ACTUAL_TEMPERATURE, "Actual Temperature", "actualTemperature", 16, false, 0.1, WireScale::Identity);
}

/// One encoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A number in the field's display unit, already rounded and
    /// clamped to the field's representable range.
    Number(f64),
    /// An enumerated text value (e.g. `"Battery"`).
    Text(&'static str),
    /// A whole-second duration.
    Duration(EngineHours),
    /// A discrete-status word; unused high bits are always zero.
    Bitmask(u16),
    /// The width-appropriate "not available" sentinel.
    NotAvailable,
}

/// One field of a composed message.
#[derive(Debug, Clone)]
pub struct Field {
    pub spec: &'static FieldSpec,
    pub value: FieldValue,
}

/// A composed protocol record, ready for the transport.
///
/// Immutable once produced; ownership transfers to the transport on
/// emission.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    pub kind: MessageKind,
    pub instance: u8,
    pub timestamp: DateTime<Utc>,
    fields: Vec<Field>,
}

impl ComposedMessage {
    /// Start a record for one kind and instance.
    pub fn new(kind: MessageKind, instance: u8) -> Self {
        Self {
            kind,
            instance,
            timestamp: Utc::now(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn push(&mut self, spec: &'static FieldSpec, value: FieldValue) {
        self.fields.push(Field { spec, value });
    }

    /// Append a numeric field, clamping into the field's range, or
    /// encode its absence per `policy`.
    pub fn push_number(
        &mut self,
        spec: &'static FieldSpec,
        value: Option<f64>,
        policy: MissingFieldPolicy,
    ) {
        match value {
            Some(v) => self.push(spec, FieldValue::Number(spec.clamp(v))),
            None => self.push_absent(spec, policy),
        }
    }

    /// Encode one absent field per `policy`.
    pub fn push_absent(&mut self, spec: &'static FieldSpec, policy: MissingFieldPolicy) {
        if policy == MissingFieldPolicy::Sentinel {
            self.push(spec, FieldValue::NotAvailable);
        }
    }

    /// The fields in schema order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by display name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.spec.name == name)
            .map(|f| &f.value)
    }

    /// Render to JSON in the given convention.
    pub fn render(&self, convention: FieldConvention) -> Value {
        match convention {
            FieldConvention::Named => self.render_named(),
            FieldConvention::Wire => self.render_wire(),
        }
    }

    fn render_named(&self) -> Value {
        let mut map = Map::new();
        map.insert("pgn".into(), json!(self.kind.pgn()));
        for field in &self.fields {
            map.insert(field.spec.name.into(), named_value(field));
        }
        Value::Object(map)
    }

    fn render_wire(&self) -> Value {
        let mut inner = Map::new();
        for field in &self.fields {
            inner.insert(field.spec.wire.into(), wire_value(field));
        }
        json!({
            "pgn": self.kind.pgn(),
            "prio": self.kind.priority(),
            "dst": 255,
            "timestamp": self.timestamp.to_rfc3339(),
            "fields": Value::Object(inner),
        })
    }
}

fn named_value(field: &Field) -> Value {
    match &field.value {
        FieldValue::Number(n) => json!(n),
        FieldValue::Text(s) => json!(s),
        FieldValue::Duration(d) => json!(d.to_iso8601()),
        FieldValue::Bitmask(m) => json!(m),
        FieldValue::NotAvailable => field.spec.sentinel(),
    }
}

fn wire_value(field: &Field) -> Value {
    match &field.value {
        FieldValue::Number(n) => json!(field.spec.wire_scale.apply(*n)),
        FieldValue::Text(s) => json!(s),
        FieldValue::Duration(d) => json!(d.total_seconds()),
        FieldValue::Bitmask(m) => json!(m),
        FieldValue::NotAvailable => field.spec.sentinel(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_metadata_is_consistent() {
        for kind in MessageKind::ALL {
            assert!(MessageKind::for_device(kind.device_kind()).contains(&kind));
        }
        assert_eq!(MessageKind::BatteryStatus.pgn(), 127_508);
        assert_eq!(
            MessageKind::EngineRapid.default_interval(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn clamp_respects_resolution_and_width() {
        let close = |a: f64, b: f64| assert!((a - b).abs() < 1e-9, "{a} != {b}");
        // 16-bit at 0.01 V: max raw 65534 → 655.34 V.
        close(fields::VOLTAGE.clamp(700.0), 655.34);
        close(fields::VOLTAGE.clamp(12.5), 12.5);
        // Signed current saturates symmetrically.
        close(fields::CURRENT.clamp(-10_000.0), -3276.6);
        // Saturation: one past the max encodes the same as the max.
        close(fields::VOLTAGE.clamp(655.35), fields::VOLTAGE.clamp(655.34));
    }

    #[test]
    fn named_render_omits_nothing_it_was_not_given() {
        let mut msg = ComposedMessage::new(MessageKind::BatteryStatus, 1);
        msg.push_number(&fields::BATTERY_INSTANCE, Some(1.0), MissingFieldPolicy::Omit);
        msg.push_number(&fields::VOLTAGE, Some(12.5), MissingFieldPolicy::Omit);
        msg.push_number(&fields::CURRENT, None, MissingFieldPolicy::Omit);

        let rendered = msg.render(FieldConvention::Named);
        assert_eq!(rendered["pgn"], 127_508);
        assert_eq!(rendered["Voltage"], 12.5);
        assert!(rendered.get("Current").is_none());
    }

    #[test]
    fn sentinel_policy_encodes_width_all_ones() {
        let mut msg = ComposedMessage::new(MessageKind::BatteryStatus, 1);
        msg.push_number(&fields::VOLTAGE, None, MissingFieldPolicy::Sentinel);
        msg.push_number(&fields::CURRENT, None, MissingFieldPolicy::Sentinel);

        let rendered = msg.render(FieldConvention::Named);
        assert_eq!(rendered["Voltage"], 65_535);
        // Signed sentinel is the max positive pattern.
        assert_eq!(rendered["Current"], 32_767);
    }

    #[test]
    fn wire_render_uses_si_units_and_metadata() {
        let mut msg = ComposedMessage::new(MessageKind::DcDetailed, 0);
        msg.push_number(&fields::STATE_OF_CHARGE, Some(93.0), MissingFieldPolicy::Omit);
        msg.push(
            &fields::TIME_REMAINING,
            FieldValue::Duration(EngineHours::from_seconds(12_340.0)),
        );

        let rendered = msg.render(FieldConvention::Wire);
        assert_eq!(rendered["pgn"], 127_506);
        assert_eq!(rendered["prio"], 6);
        assert_eq!(rendered["dst"], 255);
        assert_eq!(rendered["fields"]["stateOfCharge"], 0.93);
        assert_eq!(rendered["fields"]["timeRemaining"], 12_340);
    }

    #[test]
    fn duration_renders_iso8601_in_named_convention() {
        let mut msg = ComposedMessage::new(MessageKind::DcDetailed, 0);
        msg.push(
            &fields::TIME_REMAINING,
            FieldValue::Duration(EngineHours::from_seconds(12_340.0)),
        );
        let rendered = msg.render(FieldConvention::Named);
        assert_eq!(rendered["Time Remaining"], "PT3H25M40S");
    }
}
