//! Telemetry delivery adapters.
//!
//! Two delivery styles feed the same value cache:
//!
//! - **Push**: the feed invokes a callback with `(path, value)` for
//!   every update; the path is parsed here to find the source and
//!   field. Unknown or unmapped paths are ignored.
//! - **Poll**: a fixed, ordered key list is registered with a per-key
//!   staleness timeout, and the feed calls back with a positional tuple
//!   of current values.
//!
//! The core batching and rate-limiting code never learns which style
//! delivered a value.

use std::time::{Duration, Instant};

use tidelink_core::{DeviceKind, MappingTable, Result, Sample, ValueCache};

/// Where a pushed path points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTarget {
    /// A tracked field of a mapped device.
    Field {
        kind: DeviceKind,
        source_id: String,
        field: String,
    },
    /// An engine alarm notification.
    Alarm {
        source_id: String,
        condition: String,
    },
}

/// Parse a hierarchical path into its target.
///
/// Recognized shapes:
/// - `electrical.batteries.<id>.<field…>`
/// - `propulsion.<id>.<field…>`
/// - `notifications.propulsion.<id>.<condition>`
pub fn parse_path(path: &str) -> Option<PathTarget> {
    let parts: Vec<&str> = path.split('.').collect();
    match parts.as_slice() {
        ["electrical", "batteries", id, rest @ ..] if !rest.is_empty() => {
            Some(PathTarget::Field {
                kind: DeviceKind::Battery,
                source_id: (*id).to_string(),
                field: rest.join("."),
            })
        }
        ["notifications", "propulsion", id, rest @ ..] if !rest.is_empty() => {
            Some(PathTarget::Alarm {
                source_id: (*id).to_string(),
                condition: rest.join("."),
            })
        }
        ["propulsion", id, rest @ ..] if !rest.is_empty() => Some(PathTarget::Field {
            kind: DeviceKind::Engine,
            source_id: (*id).to_string(),
            field: rest.join("."),
        }),
        _ => None,
    }
}

/// A pull-style registration for one source: an ordered key list with a
/// shared staleness timeout, applied positionally.
#[derive(Debug, Clone)]
pub struct PollSubscription {
    pub kind: DeviceKind,
    pub source_id: String,
    pub keys: Vec<String>,
    pub timeout: Duration,
}

impl PollSubscription {
    /// Build the subscription for one mapped source.
    pub fn for_source(
        table: &MappingTable,
        kind: DeviceKind,
        source_id: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            source_id: source_id.to_string(),
            keys: table.paths_for(kind, source_id)?,
            timeout,
        })
    }

    /// Apply one positional tuple of current values to the cache.
    ///
    /// `values` lines up with `keys`; extra values are ignored, missing
    /// trailing values are treated as absent.
    pub fn apply(&self, cache: &mut ValueCache, values: &[Sample], now: Instant) {
        for (key, sample) in self.keys.iter().zip(values) {
            cache.update(key, *sample, now);
        }
    }
}
