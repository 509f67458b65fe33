//! Message composers, one per message kind.
//!
//! A composer reads its fields from the value cache (through the TTL
//! filter), converts units, evaluates the kind's emission predicate,
//! and returns zero or one composed record. Composers never touch the
//! emission gate: a predicate-false tick must not consume rate budget,
//! so gating happens in the engine after composition succeeds.

use std::time::Instant;

use tidelink_core::{DeviceMapping, ValueCache};

use crate::message::{ComposedMessage, MessageKind};

mod battery;
mod engine;
mod temperature;

pub use battery::{BatteryStatusComposer, DcDetailedComposer};
pub use engine::{EngineDynamicComposer, EngineRapidComposer};
pub use temperature::TemperatureComposer;

/// A composer for one message kind.
pub trait Compose: Send + Sync {
    /// The kind this composer produces.
    fn kind(&self) -> MessageKind;

    /// Compose a record for one source, or `None` when the kind's
    /// emission predicate is not met.
    fn compose(
        &self,
        mapping: &DeviceMapping,
        cache: &ValueCache,
        now: Instant,
    ) -> Option<ComposedMessage>;
}

/// Read one field of a source through the TTL filter.
pub(crate) fn read_field(
    cache: &ValueCache,
    mapping: &DeviceMapping,
    kind: MessageKind,
    ttl: std::time::Duration,
    field: &str,
    now: Instant,
) -> Option<f64> {
    cache.read(&mapping.path_for(kind.device_kind(), field), ttl, now)
}
