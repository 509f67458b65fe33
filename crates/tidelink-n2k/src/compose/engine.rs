//! Engine composers: PGN 127488 and PGN 127489.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tidelink_core::units::{self, AngularUnit};
use tidelink_core::{DeviceMapping, EngineHours, ValueCache};

use crate::message::{
    fields, ComposedMessage, FieldValue, MessageKind, MissingFieldPolicy,
};
use crate::status;

use super::{read_field, Compose};

/// PGN 127488: Engine Parameters, Rapid Update: rotational speed.
#[derive(Debug, Clone)]
pub struct EngineRapidComposer {
    pub ttl: Duration,
    pub policy: MissingFieldPolicy,
    /// Nearest-`rpm_step` quantization; 1 disables it.
    pub rpm_step: u32,
    /// Angular-rate convention per source id; rad/s when unlisted.
    pub angular_units: HashMap<String, AngularUnit>,
}

impl EngineRapidComposer {
    fn unit_for(&self, source_id: &str) -> AngularUnit {
        self.angular_units
            .get(source_id)
            .copied()
            .unwrap_or_default()
    }
}

impl Compose for EngineRapidComposer {
    fn kind(&self) -> MessageKind {
        MessageKind::EngineRapid
    }

    fn compose(
        &self,
        mapping: &DeviceMapping,
        cache: &ValueCache,
        now: Instant,
    ) -> Option<ComposedMessage> {
        let kind = self.kind();
        // Single-field predicate: no fresh revolutions, no record.
        let rate = read_field(cache, mapping, kind, self.ttl, "revolutions", now)?;
        let rpm = units::quantize_rpm(self.unit_for(&mapping.source_id).to_rpm(rate), self.rpm_step);

        let mut msg = ComposedMessage::new(kind, mapping.instance);
        msg.push(
            &fields::ENGINE_INSTANCE,
            FieldValue::Number(f64::from(mapping.instance)),
        );
        msg.push_number(&fields::SPEED, Some(rpm), self.policy);
        Some(msg)
    }
}

/// PGN 127489: Engine Parameters, Dynamic: pressures, temperatures,
/// electrical, fuel, runtime, load/torque, and discrete status words.
#[derive(Debug, Clone)]
pub struct EngineDynamicComposer {
    pub ttl: Duration,
    pub policy: MissingFieldPolicy,
}

impl Compose for EngineDynamicComposer {
    fn kind(&self) -> MessageKind {
        MessageKind::EngineDynamic
    }

    fn compose(
        &self,
        mapping: &DeviceMapping,
        cache: &ValueCache,
        now: Instant,
    ) -> Option<ComposedMessage> {
        let kind = self.kind();
        let read = |field| read_field(cache, mapping, kind, self.ttl, field, now);

        let oil_pressure = read("oilPressure").map(units::pascal_to_kilopascal);
        let oil_temperature = read("oilTemperature").map(units::round_temperature);
        let coolant_temperature = read("temperature").map(units::round_temperature);
        let alternator = read("alternatorVoltage").map(units::round_voltage);
        let fuel_rate = read("fuel.rate")
            .filter(|rate| *rate > 0.0)
            .map(units::cubic_meters_per_second_to_liters_per_hour);
        let run_time = read("runTime").filter(|s| *s >= 0.0);
        let coolant_pressure = read("coolantPressure").map(units::pascal_to_kilopascal);
        let fuel_pressure = read("fuel.pressure").map(units::pascal_to_kilopascal);
        let load = read("engineLoad").map(units::ratio_to_percent);
        let torque = read("engineTorque").map(units::ratio_to_percent);

        let status1 = status::read_mask(
            status::DISCRETE_STATUS_1,
            cache,
            &mapping.source_id,
            self.ttl,
            now,
        );
        let status2 = status::read_mask(
            status::DISCRETE_STATUS_2,
            cache,
            &mapping.source_id,
            self.ttl,
            now,
        );

        let any_measurement = [
            oil_pressure,
            oil_temperature,
            coolant_temperature,
            alternator,
            fuel_rate,
            run_time,
            coolant_pressure,
            fuel_pressure,
            load,
            torque,
        ]
        .iter()
        .any(Option::is_some);

        if !any_measurement && status1.is_none() && status2.is_none() {
            return None;
        }

        let mut msg = ComposedMessage::new(kind, mapping.instance);
        msg.push(
            &fields::ENGINE_INSTANCE,
            FieldValue::Number(f64::from(mapping.instance)),
        );
        msg.push_number(&fields::OIL_PRESSURE, oil_pressure, self.policy);
        msg.push_number(&fields::OIL_TEMPERATURE, oil_temperature, self.policy);
        msg.push_number(&fields::COOLANT_TEMPERATURE, coolant_temperature, self.policy);
        msg.push_number(&fields::ALTERNATOR_POTENTIAL, alternator, self.policy);
        msg.push_number(&fields::FUEL_RATE, fuel_rate, self.policy);
        match run_time {
            Some(seconds) => msg.push(
                &fields::TOTAL_ENGINE_HOURS,
                FieldValue::Duration(EngineHours::from_seconds(seconds)),
            ),
            None => msg.push_absent(&fields::TOTAL_ENGINE_HOURS, self.policy),
        }
        msg.push_number(&fields::COOLANT_PRESSURE, coolant_pressure, self.policy);
        msg.push_number(&fields::FUEL_PRESSURE, fuel_pressure, self.policy);
        match status1 {
            Some(mask) => msg.push(&fields::DISCRETE_STATUS_1, FieldValue::Bitmask(mask)),
            None => msg.push_absent(&fields::DISCRETE_STATUS_1, self.policy),
        }
        match status2 {
            Some(mask) => msg.push(&fields::DISCRETE_STATUS_2, FieldValue::Bitmask(mask)),
            None => msg.push_absent(&fields::DISCRETE_STATUS_2, self.policy),
        }
        msg.push_number(&fields::ENGINE_LOAD, load, self.policy);
        msg.push_number(&fields::ENGINE_TORQUE, torque, self.policy);
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tidelink_core::Sample;

    const TTL: Duration = Duration::from_secs(5);

    fn seed(cache: &mut ValueCache, field: &str, value: f64, now: Instant) {
        let key = format!("propulsion.port.{field}");
        cache.update(&key, Sample::Present(value), now);
    }

    #[test]
    fn rapid_converts_rad_per_sec_and_quantizes() {
        let mut cache = ValueCache::new();
        let now = Instant::now();
        seed(&mut cache, "revolutions", 209.44, now);
        let mapping = DeviceMapping::new("port", 0);

        let composer = EngineRapidComposer {
            ttl: Duration::from_secs(1),
            policy: MissingFieldPolicy::Omit,
            rpm_step: 10,
            angular_units: HashMap::new(),
        };
        let msg = composer.compose(&mapping, &cache, now).unwrap();
        assert_eq!(msg.field("Speed"), Some(&FieldValue::Number(2000.0)));
    }

    #[test]
    fn rapid_honors_revolutions_per_second_sources() {
        let mut cache = ValueCache::new();
        let now = Instant::now();
        seed(&mut cache, "revolutions", 33.5, now);
        let mapping = DeviceMapping::new("port", 0);

        let composer = EngineRapidComposer {
            ttl: Duration::from_secs(1),
            policy: MissingFieldPolicy::Omit,
            rpm_step: 10,
            angular_units: HashMap::from([(
                "port".to_string(),
                AngularUnit::RevolutionsPerSecond,
            )]),
        };
        let msg = composer.compose(&mapping, &cache, now).unwrap();
        assert_eq!(msg.field("Speed"), Some(&FieldValue::Number(2010.0)));
    }

    #[test]
    fn rapid_without_revolutions_emits_nothing() {
        let cache = ValueCache::new();
        let mapping = DeviceMapping::new("port", 0);
        let composer = EngineRapidComposer {
            ttl: Duration::from_secs(1),
            policy: MissingFieldPolicy::Omit,
            rpm_step: 10,
            angular_units: HashMap::new(),
        };
        assert!(composer.compose(&mapping, &cache, Instant::now()).is_none());
    }

    #[test]
    fn dynamic_converts_pressures_and_fuel_rate() {
        let mut cache = ValueCache::new();
        let now = Instant::now();
        seed(&mut cache, "oilPressure", 350_000.0, now);
        seed(&mut cache, "fuel.rate", 1e-5, now);
        seed(&mut cache, "runTime", 3661.9, now);
        let mapping = DeviceMapping::new("port", 1);

        let composer = EngineDynamicComposer {
            ttl: TTL,
            policy: MissingFieldPolicy::Omit,
        };
        let msg = composer.compose(&mapping, &cache, now).unwrap();
        assert_eq!(msg.field("Oil pressure"), Some(&FieldValue::Number(350.0)));
        assert_eq!(msg.field("Fuel Rate"), Some(&FieldValue::Number(36.0)));
        assert_eq!(
            msg.field("Total Engine hours"),
            Some(&FieldValue::Duration(EngineHours::from_seconds(3661.0)))
        );
    }

    #[test]
    fn dynamic_drops_non_positive_fuel_rate() {
        let mut cache = ValueCache::new();
        let now = Instant::now();
        seed(&mut cache, "fuel.rate", 0.0, now);
        seed(&mut cache, "temperature", 360.0, now);
        let mapping = DeviceMapping::new("port", 1);

        let composer = EngineDynamicComposer {
            ttl: TTL,
            policy: MissingFieldPolicy::Omit,
        };
        let msg = composer.compose(&mapping, &cache, now).unwrap();
        assert!(msg.field("Fuel Rate").is_none());
    }

    #[test]
    fn dynamic_includes_status_words_when_alarms_exist() {
        let mut cache = ValueCache::new();
        let now = Instant::now();
        cache.update(
            &status::alarm_path("port", "lowOilPressure"),
            status::alarm_sample(&json!("alarm")),
            now,
        );

        let mapping = DeviceMapping::new("port", 1);
        let composer = EngineDynamicComposer {
            ttl: TTL,
            policy: MissingFieldPolicy::Omit,
        };
        // Status data alone satisfies the predicate.
        let msg = composer.compose(&mapping, &cache, now).unwrap();
        assert_eq!(
            msg.field("Discrete Status 1"),
            Some(&FieldValue::Bitmask(1 << 2))
        );
        assert!(msg.field("Discrete Status 2").is_none());
    }
}
