//! Tagged telemetry samples.
//!
//! Telemetry feeds deliver values in two shapes: a bare number, or an
//! object wrapping the number under a `value` key. Both are normalized
//! here, once, at the boundary. Downstream code only ever sees a
//! [`Sample`] and never re-inspects raw JSON.

use serde_json::Value;

/// A normalized telemetry value: a finite number, or nothing.
///
/// Non-finite numbers (NaN, ±∞) normalize to [`Sample::Absent`] so the
/// value cache never stores them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// A finite numeric reading.
    Present(f64),
    /// No usable reading.
    Absent,
}

impl Sample {
    /// Normalize a bare number.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Sample::Present(value)
        } else {
            Sample::Absent
        }
    }

    /// Normalize a raw JSON value.
    ///
    /// Accepts a bare number or a `{ "value": … }` wrapper (one level;
    /// wrappers do not nest in practice). Booleans map to 1.0/0.0 so
    /// alarm-style feeds can share the numeric cache. Everything else
    /// is absent.
    pub fn from_json(raw: &Value) -> Self {
        match raw {
            Value::Number(n) => n.as_f64().map(Self::from_f64).unwrap_or(Sample::Absent),
            Value::Bool(b) => Sample::Present(if *b { 1.0 } else { 0.0 }),
            Value::Object(map) => match map.get("value") {
                Some(inner) if !inner.is_object() => Self::from_json(inner),
                _ => Sample::Absent,
            },
            _ => Sample::Absent,
        }
    }

    /// The contained value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Sample::Present(v) => Some(*v),
            Sample::Absent => None,
        }
    }

    /// Whether a value is present.
    pub fn is_present(&self) -> bool {
        matches!(self, Sample::Present(_))
    }
}

impl From<Option<f64>> for Sample {
    fn from(value: Option<f64>) -> Self {
        value.map(Sample::from_f64).unwrap_or(Sample::Absent)
    }
}

impl From<f64> for Sample {
    fn from(value: f64) -> Self {
        Sample::from_f64(value)
    }
}
