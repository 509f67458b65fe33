//! Core conversion components for Tidelink.
//!
//! Tidelink turns sparse, asynchronously-arriving vessel telemetry
//! (battery and engine readings keyed by hierarchical Signal K-style
//! paths) into fixed-cadence NMEA 2000-style protocol records. This
//! crate holds the leaf components of that pipeline:
//!
//! - **Samples**: telemetry values normalized once at the boundary into
//!   a tagged present/absent type ([`sample::Sample`]).
//! - **Units**: pure conversion, rounding, and clamping functions
//!   ([`units`]).
//! - **Value cache**: last-known values per source with read-side
//!   staleness ([`cache::ValueCache`]).
//! - **Emission gate**: minimum inter-emission interval per
//!   (instance, message kind) ([`rate::EmissionGate`]).
//! - **Device mapping**: source id → protocol instance configuration
//!   with fail-fast validation ([`mapping::MappingTable`]).
//!
//! Everything here is synchronous and allocation-light; the message
//! composers, scheduler, and transport seam live in `tidelink-n2k`.

pub mod cache;
pub mod error;
pub mod mapping;
pub mod rate;
pub mod sample;
pub mod units;

pub use cache::ValueCache;
pub use error::{Error, Result};
pub use mapping::{DeviceKind, DeviceMapping, MappingTable};
pub use rate::EmissionGate;
pub use sample::Sample;
pub use units::{AngularUnit, EngineHours};
