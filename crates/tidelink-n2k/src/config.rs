//! Engine configuration.
//!
//! Per-kind device mapping lists plus deployment-wide knobs for the
//! missing-field policy, the output convention, rpm quantization, and
//! per-kind cadence/staleness overrides. Validation is fail-fast at
//! load time.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tidelink_core::units::AngularUnit;
use tidelink_core::{DeviceMapping, MappingTable};

use crate::error::{Error, Result};
use crate::message::{FieldConvention, MessageKind, MissingFieldPolicy};

/// One battery mapped to a protocol instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryMapping {
    /// Source id under `electrical.batteries`.
    pub signal_source_id: String,
    /// Protocol instance number.
    pub instance_id: u8,
    /// Full override path for a non-standard temperature sensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_path: Option<String>,
}

/// One engine mapped to a protocol instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMapping {
    /// Source id under `propulsion`.
    pub signal_source_id: String,
    /// Protocol instance number.
    pub instance_id: u8,
    /// Angular-rate convention of this engine's revolutions feed.
    #[serde(default)]
    pub angular_unit: AngularUnit,
}

/// Full engine configuration for one deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Batteries to publish.
    pub batteries: Vec<BatteryMapping>,
    /// Engines to publish.
    pub engines: Vec<EngineMapping>,
    /// How absent fields are encoded.
    pub missing_field_policy: MissingFieldPolicy,
    /// Output naming/unit convention.
    pub field_convention: FieldConvention,
    /// Rotational-speed quantization step in rpm (1 disables).
    pub rpm_step: u32,
    /// Compose eligible kinds immediately on each telemetry update, in
    /// addition to the periodic timers.
    pub event_driven: bool,
    /// Per-kind emission interval overrides, milliseconds.
    pub intervals_ms: HashMap<MessageKind, u64>,
    /// Per-kind staleness window overrides, milliseconds.
    pub ttls_ms: HashMap<MessageKind, u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batteries: Vec::new(),
            engines: Vec::new(),
            missing_field_policy: MissingFieldPolicy::default(),
            field_convention: FieldConvention::default(),
            rpm_step: 10,
            event_driven: false,
            intervals_ms: HashMap::new(),
            ttls_ms: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from raw JSON.
    pub fn from_json(raw: &Value) -> Result<Self> {
        let config: Self = serde_json::from_value(raw.clone())
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        config.mapping_table()?;
        Ok(config)
    }

    /// Build the validated mapping table.
    ///
    /// Fails on duplicate instances within a device kind.
    pub fn mapping_table(&self) -> Result<MappingTable> {
        let batteries = self
            .batteries
            .iter()
            .map(|b| {
                let mut mapping = DeviceMapping::new(&b.signal_source_id, b.instance_id);
                if let Some(path) = &b.temperature_path {
                    mapping = mapping.with_override("temperature", path);
                }
                mapping
            })
            .collect();
        let engines = self
            .engines
            .iter()
            .map(|e| DeviceMapping::new(&e.signal_source_id, e.instance_id))
            .collect();
        Ok(MappingTable::new(batteries, engines)?)
    }

    /// Angular-rate conventions keyed by engine source id.
    pub fn angular_units(&self) -> HashMap<String, AngularUnit> {
        self.engines
            .iter()
            .map(|e| (e.signal_source_id.clone(), e.angular_unit))
            .collect()
    }

    /// Emission interval for one kind, override applied.
    pub fn interval(&self, kind: MessageKind) -> Duration {
        self.intervals_ms
            .get(&kind)
            .map(|ms| Duration::from_millis(*ms))
            .unwrap_or_else(|| kind.default_interval())
    }

    /// Staleness window for one kind, override applied.
    pub fn ttl(&self, kind: MessageKind) -> Duration {
        self.ttls_ms
            .get(&kind)
            .map(|ms| Duration::from_millis(*ms))
            .unwrap_or_else(|| kind.default_ttl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_config() {
        let config = EngineConfig::from_json(&json!({
            "batteries": [
                { "signalSourceId": "house", "instanceId": 0 },
                { "signalSourceId": "starter", "instanceId": 1 }
            ],
            "engines": [
                { "signalSourceId": "port", "instanceId": 0, "angularUnit": "revolutionsPerSecond" }
            ]
        }))
        .unwrap();

        assert_eq!(config.batteries.len(), 2);
        assert_eq!(
            config.angular_units()["port"],
            AngularUnit::RevolutionsPerSecond
        );
        assert_eq!(config.missing_field_policy, MissingFieldPolicy::Omit);
        assert_eq!(config.rpm_step, 10);
    }

    #[test]
    fn duplicate_instance_fails_at_load() {
        let result = EngineConfig::from_json(&json!({
            "batteries": [
                { "signalSourceId": "house", "instanceId": 0 },
                { "signalSourceId": "starter", "instanceId": 0 }
            ]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn interval_and_ttl_overrides() {
        let config = EngineConfig::from_json(&json!({
            "intervalsMs": { "batteryStatus": 100 },
            "ttlsMs": { "engineRapid": 2000 }
        }))
        .unwrap();
        assert_eq!(
            config.interval(MessageKind::BatteryStatus),
            Duration::from_millis(100)
        );
        assert_eq!(
            config.interval(MessageKind::EngineRapid),
            Duration::from_millis(250)
        );
        assert_eq!(config.ttl(MessageKind::EngineRapid), Duration::from_secs(2));
    }

    #[test]
    fn temperature_path_becomes_an_override() {
        let config = EngineConfig::from_json(&json!({
            "batteries": [{
                "signalSourceId": "house",
                "instanceId": 0,
                "temperaturePath": "environment.inside.engineRoom.temperature"
            }]
        }))
        .unwrap();
        let table = config.mapping_table().unwrap();
        let mapping = table
            .by_source(tidelink_core::DeviceKind::Battery, "house")
            .unwrap();
        assert_eq!(
            mapping.path_for(tidelink_core::DeviceKind::Battery, "temperature"),
            "environment.inside.engineRoom.temperature"
        );
    }
}
