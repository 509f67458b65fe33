//! Battery composers: PGN 127508 and PGN 127506.

use std::time::{Duration, Instant};

use tidelink_core::units;
use tidelink_core::{DeviceMapping, EngineHours, ValueCache};

use crate::message::{
    fields, ComposedMessage, FieldValue, MessageKind, MissingFieldPolicy,
};

use super::{read_field, Compose};

/// PGN 127508: Battery Status: voltage, current, case temperature.
#[derive(Debug, Clone)]
pub struct BatteryStatusComposer {
    pub ttl: Duration,
    pub policy: MissingFieldPolicy,
}

impl Compose for BatteryStatusComposer {
    fn kind(&self) -> MessageKind {
        MessageKind::BatteryStatus
    }

    fn compose(
        &self,
        mapping: &DeviceMapping,
        cache: &ValueCache,
        now: Instant,
    ) -> Option<ComposedMessage> {
        let kind = self.kind();
        let read = |field| read_field(cache, mapping, kind, self.ttl, field, now);

        let voltage = read("voltage").map(units::round_voltage);
        let current = read("current").map(units::round_current);
        let temperature = read("temperature").map(units::round_temperature);

        // Any-of predicate: at least one measurement must be fresh.
        if voltage.is_none() && current.is_none() && temperature.is_none() {
            return None;
        }

        let mut msg = ComposedMessage::new(kind, mapping.instance);
        msg.push(
            &fields::BATTERY_INSTANCE,
            FieldValue::Number(f64::from(mapping.instance)),
        );
        msg.push_number(&fields::VOLTAGE, voltage, self.policy);
        msg.push_number(&fields::CURRENT, current, self.policy);
        msg.push_number(&fields::BATTERY_TEMPERATURE, temperature, self.policy);
        Some(msg)
    }
}

/// PGN 127506: DC Detailed Status: charge, health, time remaining,
/// ripple, amp-hours.
#[derive(Debug, Clone)]
pub struct DcDetailedComposer {
    pub ttl: Duration,
    pub policy: MissingFieldPolicy,
}

impl Compose for DcDetailedComposer {
    fn kind(&self) -> MessageKind {
        MessageKind::DcDetailed
    }

    fn compose(
        &self,
        mapping: &DeviceMapping,
        cache: &ValueCache,
        now: Instant,
    ) -> Option<ComposedMessage> {
        let kind = self.kind();
        let read = |field| read_field(cache, mapping, kind, self.ttl, field, now);

        let soc = read("capacity.stateOfCharge").map(units::ratio_to_percent);
        let soh = read("capacity.stateOfHealth").map(units::ratio_to_percent);
        let time_remaining = read("capacity.timeRemaining");
        let ripple = read("ripple").map(units::round_voltage);
        let amp_hours = read("ampHours").map(f64::round);

        if soc.is_none()
            && soh.is_none()
            && time_remaining.is_none()
            && ripple.is_none()
            && amp_hours.is_none()
        {
            return None;
        }

        let mut msg = ComposedMessage::new(kind, mapping.instance);
        msg.push(
            &fields::DC_INSTANCE,
            FieldValue::Number(f64::from(mapping.instance)),
        );
        msg.push(&fields::DC_TYPE, FieldValue::Text("Battery"));
        msg.push_number(&fields::STATE_OF_CHARGE, soc, self.policy);
        msg.push_number(&fields::STATE_OF_HEALTH, soh, self.policy);
        match time_remaining {
            Some(seconds) => msg.push(
                &fields::TIME_REMAINING,
                FieldValue::Duration(EngineHours::from_seconds(seconds)),
            ),
            None => msg.push_absent(&fields::TIME_REMAINING, self.policy),
        }
        msg.push_number(&fields::RIPPLE_VOLTAGE, ripple, self.policy);
        msg.push_number(&fields::AMP_HOURS, amp_hours, self.policy);
        Some(msg)
    }
}
