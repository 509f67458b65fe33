//! Device mapping configuration.
//!
//! A [`DeviceMapping`] associates one logical telemetry source (a
//! battery or engine id in the path hierarchy) with a protocol
//! instance number, plus optional per-field path overrides for
//! non-standard sources (e.g. a battery whose temperature lives under a
//! custom sensor path). The [`MappingTable`] is built once from
//! configuration and validated fail-fast: two devices of the same kind
//! must never share an instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of physical device a mapping describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Battery,
    Engine,
}

impl DeviceKind {
    /// Root of this kind's path hierarchy.
    pub fn base_path(&self) -> &'static str {
        match self {
            DeviceKind::Battery => "electrical.batteries",
            DeviceKind::Engine => "propulsion",
        }
    }

    /// Standard relative field paths tracked for this kind.
    pub fn standard_fields(&self) -> &'static [&'static str] {
        match self {
            DeviceKind::Battery => BATTERY_FIELDS,
            DeviceKind::Engine => ENGINE_FIELDS,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Battery => write!(f, "battery"),
            DeviceKind::Engine => write!(f, "engine"),
        }
    }
}

/// Relative battery field paths, in subscription order.
pub const BATTERY_FIELDS: &[&str] = &[
    "voltage",
    "current",
    "temperature",
    "capacity.stateOfCharge",
    "capacity.timeRemaining",
    "capacity.stateOfHealth",
    "ripple",
    "ampHours",
];

/// Relative engine field paths, in subscription order.
pub const ENGINE_FIELDS: &[&str] = &[
    "revolutions",
    "oilPressure",
    "oilTemperature",
    "temperature",
    "alternatorVoltage",
    "fuel.rate",
    "fuel.pressure",
    "coolantPressure",
    "runTime",
    "engineLoad",
    "engineTorque",
];

/// One logical source mapped to a protocol instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceMapping {
    /// Source id within the path hierarchy (e.g. `house`, `port`).
    pub source_id: String,
    /// Protocol instance number, unique per device kind.
    pub instance: u8,
    /// Full-path overrides per relative field name.
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

impl DeviceMapping {
    /// Create a mapping with no overrides.
    pub fn new(source_id: impl Into<String>, instance: u8) -> Self {
        Self {
            source_id: source_id.into(),
            instance,
            overrides: HashMap::new(),
        }
    }

    /// Add a full-path override for one field.
    pub fn with_override(mut self, field: impl Into<String>, path: impl Into<String>) -> Self {
        self.overrides.insert(field.into(), path.into());
        self
    }

    /// Resolve the cache key for one field of this source.
    pub fn path_for(&self, kind: DeviceKind, field: &str) -> String {
        if let Some(path) = self.overrides.get(field) {
            return path.clone();
        }
        format!("{}.{}.{}", kind.base_path(), self.source_id, field)
    }
}

/// Validated set of device mappings for one deployment.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    batteries: Vec<DeviceMapping>,
    engines: Vec<DeviceMapping>,
}

impl MappingTable {
    /// Build a table, rejecting duplicate instances within a kind.
    pub fn new(batteries: Vec<DeviceMapping>, engines: Vec<DeviceMapping>) -> Result<Self> {
        check_unique(DeviceKind::Battery, &batteries)?;
        check_unique(DeviceKind::Engine, &engines)?;
        Ok(Self { batteries, engines })
    }

    /// Mappings of one kind.
    pub fn of_kind(&self, kind: DeviceKind) -> &[DeviceMapping] {
        match kind {
            DeviceKind::Battery => &self.batteries,
            DeviceKind::Engine => &self.engines,
        }
    }

    /// Look up a mapping by kind and source id.
    pub fn by_source(&self, kind: DeviceKind, source_id: &str) -> Option<&DeviceMapping> {
        self.of_kind(kind).iter().find(|m| m.source_id == source_id)
    }

    /// All cache keys tracked for one source, overrides applied.
    pub fn paths_for(&self, kind: DeviceKind, source_id: &str) -> Result<Vec<String>> {
        let mapping = self
            .by_source(kind, source_id)
            .ok_or_else(|| Error::UnknownSource(source_id.to_string()))?;
        Ok(kind
            .standard_fields()
            .iter()
            .map(|field| mapping.path_for(kind, field))
            .collect())
    }

    /// Total number of mapped devices.
    pub fn len(&self) -> usize {
        self.batteries.len() + self.engines.len()
    }

    /// Whether the table maps no devices.
    pub fn is_empty(&self) -> bool {
        self.batteries.is_empty() && self.engines.is_empty()
    }
}

fn check_unique(kind: DeviceKind, mappings: &[DeviceMapping]) -> Result<()> {
    let mut seen: HashMap<u8, &str> = HashMap::new();
    for mapping in mappings {
        if let Some(first) = seen.insert(mapping.instance, &mapping.source_id) {
            return Err(Error::DuplicateInstance {
                kind,
                instance: mapping.instance,
                first: first.to_string(),
                second: mapping.source_id.clone(),
            });
        }
    }
    Ok(())
}
