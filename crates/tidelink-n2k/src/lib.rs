//! NMEA 2000-style message conversion for Tidelink.
//!
//! Turns the sparse telemetry cached by `tidelink-core` into
//! fixed-cadence protocol records for five message kinds:
//!
//! | Kind | PGN | Cadence |
//! |------|-----|---------|
//! | Engine Parameters, Rapid Update | 127488 | 250 ms |
//! | Engine Parameters, Dynamic | 127489 | 1 s |
//! | DC Detailed Status | 127506 | 1 s |
//! | Battery Status | 127508 | 1 s |
//! | Temperature | 130312 | 2 s |
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use tidelink_n2k::{ConversionEngine, EngineConfig, MemorySink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::from_json(&json!({
//!         "batteries": [{ "signalSourceId": "house", "instanceId": 0 }]
//!     }))?;
//!     let engine = ConversionEngine::new(config)?;
//!
//!     let sink = Arc::new(MemorySink::new());
//!     engine.start(sink.clone()).await?;
//!
//!     engine
//!         .handle_update("electrical.batteries.house.voltage", &json!(12.5))
//!         .await;
//!
//!     // … records now flow into the sink at each kind's cadence.
//!     engine.stop().await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod message;
pub mod scheduler;
pub mod status;

pub use adapters::{parse_path, PathTarget, PollSubscription};
pub use compose::Compose;
pub use config::{BatteryMapping, EngineConfig, EngineMapping};
pub use engine::{ConversionEngine, MemorySink, MessageSink};
pub use error::{Error, Result};
pub use message::{
    ComposedMessage, FieldConvention, FieldValue, MessageKind, MissingFieldPolicy,
};
pub use scheduler::Scheduler;
