//! Temperature composer: PGN 130312.
//!
//! Reports a battery case temperature as a standalone temperature
//! record. The source path honors the mapping's `temperature` override,
//! which is how non-standard sensors (e.g. an engine-room probe) are
//! wired to a battery instance.

use std::time::{Duration, Instant};

use tidelink_core::units;
use tidelink_core::{DeviceMapping, ValueCache};

use crate::message::{fields, ComposedMessage, FieldValue, MessageKind, MissingFieldPolicy};

use super::{read_field, Compose};

/// PGN 130312: Temperature.
#[derive(Debug, Clone)]
pub struct TemperatureComposer {
    pub ttl: Duration,
    pub policy: MissingFieldPolicy,
}

impl Compose for TemperatureComposer {
    fn kind(&self) -> MessageKind {
        MessageKind::Temperature
    }

    fn compose(
        &self,
        mapping: &DeviceMapping,
        cache: &ValueCache,
        now: Instant,
    ) -> Option<ComposedMessage> {
        let kind = self.kind();
        // Single-field predicate.
        let temperature = read_field(cache, mapping, kind, self.ttl, "temperature", now)
            .map(units::round_temperature)?;

        let mut msg = ComposedMessage::new(kind, mapping.instance);
        msg.push(
            &fields::TEMP_INSTANCE,
            FieldValue::Number(f64::from(mapping.instance)),
        );
        msg.push(&fields::TEMP_SOURCE, FieldValue::Text("Battery"));
        msg.push_number(&fields::ACTUAL_TEMPERATURE, Some(temperature), self.policy);
        Some(msg)
    }
}
