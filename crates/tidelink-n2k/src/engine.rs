//! The conversion engine: lifecycle, wiring, and the transport seam.
//!
//! One [`ConversionEngine`] owns the per-source value caches, the
//! emission gate, one composer per message kind, and (while started) a
//! scheduler of periodic emission tasks. Telemetry reaches it through
//! [`ConversionEngine::handle_update`] (push style) or
//! [`ConversionEngine::apply_poll`] (poll style); composed records
//! leave through a [`MessageSink`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use tidelink_core::{DeviceKind, EmissionGate, MappingTable, Sample, ValueCache};

use crate::adapters::{parse_path, PathTarget, PollSubscription};
use crate::compose::{
    BatteryStatusComposer, Compose, DcDetailedComposer, EngineDynamicComposer,
    EngineRapidComposer, TemperatureComposer,
};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::message::{ComposedMessage, MessageKind};
use crate::scheduler::Scheduler;
use crate::status;

/// Transport seam: receives composed records and their rendered
/// payloads. Ownership of the record transfers on emission.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Put one record on the bus.
    async fn emit(&self, message: &ComposedMessage, payload: Value);
}

/// Sink that collects rendered payloads in memory. Used in tests and
/// dry runs.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(MessageKind, u8, Value)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all received records.
    pub async fn records(&self) -> Vec<(MessageKind, u8, Value)> {
        self.records.lock().await.clone()
    }

    /// Drain all received records.
    pub async fn take(&self) -> Vec<(MessageKind, u8, Value)> {
        std::mem::take(&mut *self.records.lock().await)
    }
}

#[async_trait]
impl MessageSink for MemorySink {
    async fn emit(&self, message: &ComposedMessage, payload: Value) {
        self.records
            .lock()
            .await
            .push((message.kind, message.instance, payload));
    }
}

/// Mutable engine state, touched by adapter callbacks and scheduler
/// ticks.
struct EngineState {
    caches: HashMap<(DeviceKind, String), ValueCache>,
    gate: EmissionGate<(u8, MessageKind)>,
}

struct EngineInner {
    config: EngineConfig,
    table: MappingTable,
    composers: HashMap<MessageKind, Arc<dyn Compose>>,
    /// Full override path → owning source, for push-style delivery of
    /// custom sensor paths.
    override_index: HashMap<String, (DeviceKind, String)>,
    state: RwLock<EngineState>,
    sink: RwLock<Option<Arc<dyn MessageSink>>>,
}

impl EngineInner {
    /// Run one composition pass for (kind, source). Returns the record
    /// that was emitted, if any.
    ///
    /// Order matters: the emission predicate runs first, and only a
    /// successful composition consults the gate, so a zero-data tick
    /// never consumes rate budget.
    async fn tick(&self, kind: MessageKind, source_id: &str) -> Option<ComposedMessage> {
        let device_kind = kind.device_kind();
        let mapping = self.table.by_source(device_kind, source_id)?;
        let composer = self.composers.get(&kind)?;
        let now = Instant::now();

        let message = {
            let state = self.state.read().await;
            let cache = state.caches.get(&(device_kind, source_id.to_string()))?;
            composer.compose(mapping, cache, now)
        };
        let Some(message) = message else {
            tracing::trace!(kind = %kind, source = source_id, "no fresh data, emission skipped");
            return None;
        };

        let allowed = {
            let mut state = self.state.write().await;
            state
                .gate
                .allow((mapping.instance, kind), self.config.interval(kind), now)
        };
        if !allowed {
            tracing::trace!(kind = %kind, source = source_id, "rate limited");
            return None;
        }

        let sink = self.sink.read().await.clone();
        if let Some(sink) = sink {
            let payload = message.render(self.config.field_convention);
            tracing::debug!(
                kind = %kind,
                instance = mapping.instance,
                "emitting record"
            );
            sink.emit(&message, payload).await;
        }
        Some(message)
    }

    async fn apply_update(&self, path: &str, raw: &Value) -> Option<(DeviceKind, String)> {
        let (device_kind, source_id, sample) =
            if let Some((kind, source)) = self.override_index.get(path) {
                (*kind, source.clone(), Sample::from_json(raw))
            } else {
                match parse_path(path)? {
                    PathTarget::Field {
                        kind, source_id, ..
                    } => (kind, source_id, Sample::from_json(raw)),
                    PathTarget::Alarm { source_id, .. } => {
                        (DeviceKind::Engine, source_id, status::alarm_sample(raw))
                    }
                }
            };

        if self.table.by_source(device_kind, &source_id).is_none() {
            tracing::debug!(path, "update for unmapped source ignored");
            return None;
        }

        let mut state = self.state.write().await;
        let cache = state
            .caches
            .get_mut(&(device_kind, source_id.clone()))?;
        cache
            .update(path, sample, Instant::now())
            .then_some((device_kind, source_id))
    }
}

/// The conversion engine for one deployment.
pub struct ConversionEngine {
    inner: Arc<EngineInner>,
    scheduler: Mutex<Scheduler>,
}

impl ConversionEngine {
    /// Build an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let table = config.mapping_table()?;

        let mut composers: HashMap<MessageKind, Arc<dyn Compose>> = HashMap::new();
        let policy = config.missing_field_policy;
        composers.insert(
            MessageKind::BatteryStatus,
            Arc::new(BatteryStatusComposer {
                ttl: config.ttl(MessageKind::BatteryStatus),
                policy,
            }),
        );
        composers.insert(
            MessageKind::DcDetailed,
            Arc::new(DcDetailedComposer {
                ttl: config.ttl(MessageKind::DcDetailed),
                policy,
            }),
        );
        composers.insert(
            MessageKind::Temperature,
            Arc::new(TemperatureComposer {
                ttl: config.ttl(MessageKind::Temperature),
                policy,
            }),
        );
        composers.insert(
            MessageKind::EngineRapid,
            Arc::new(EngineRapidComposer {
                ttl: config.ttl(MessageKind::EngineRapid),
                policy,
                rpm_step: config.rpm_step,
                angular_units: config.angular_units(),
            }),
        );
        composers.insert(
            MessageKind::EngineDynamic,
            Arc::new(EngineDynamicComposer {
                ttl: config.ttl(MessageKind::EngineDynamic),
                policy,
            }),
        );

        let mut caches = HashMap::new();
        let mut override_index = HashMap::new();
        for kind in [DeviceKind::Battery, DeviceKind::Engine] {
            for mapping in table.of_kind(kind) {
                caches.insert((kind, mapping.source_id.clone()), ValueCache::new());
                for path in mapping.overrides.values() {
                    override_index.insert(path.clone(), (kind, mapping.source_id.clone()));
                }
            }
        }

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                table,
                composers,
                override_index,
                state: RwLock::new(EngineState {
                    caches,
                    gate: EmissionGate::new(),
                }),
                sink: RwLock::new(None),
            }),
            scheduler: Mutex::new(Scheduler::new()),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// The validated mapping table.
    pub fn mapping_table(&self) -> &MappingTable {
        &self.inner.table
    }

    /// Push-style delivery: one `(path, value)` update.
    ///
    /// Unknown paths and unmapped sources are ignored. With
    /// `event_driven` enabled, eligible kinds are composed immediately
    /// after the cache write (the gate still applies).
    pub async fn handle_update(&self, path: &str, raw: &Value) {
        let Some((device_kind, source_id)) = self.inner.apply_update(path, raw).await else {
            return;
        };
        if self.inner.config.event_driven {
            for kind in MessageKind::for_device(device_kind) {
                self.inner.tick(*kind, &source_id).await;
            }
        }
    }

    /// Poll-style registrations for every mapped source.
    pub fn poll_subscriptions(&self) -> Result<Vec<PollSubscription>> {
        let mut subs = Vec::with_capacity(self.inner.table.len());
        for (kind, ttl_kind) in [
            (DeviceKind::Battery, MessageKind::BatteryStatus),
            (DeviceKind::Engine, MessageKind::EngineDynamic),
        ] {
            for mapping in self.inner.table.of_kind(kind) {
                subs.push(PollSubscription::for_source(
                    &self.inner.table,
                    kind,
                    &mapping.source_id,
                    self.inner.config.ttl(ttl_kind),
                )?);
            }
        }
        Ok(subs)
    }

    /// Poll-style delivery: one positional tuple of current values for
    /// a registered subscription.
    pub async fn apply_poll(&self, sub: &PollSubscription, values: &[Sample]) {
        {
            let mut state = self.inner.state.write().await;
            let Some(cache) = state.caches.get_mut(&(sub.kind, sub.source_id.clone())) else {
                tracing::debug!(source = %sub.source_id, "poll for unmapped source ignored");
                return;
            };
            sub.apply(cache, values, Instant::now());
        }
        if self.inner.config.event_driven {
            for kind in MessageKind::for_device(sub.kind) {
                self.inner.tick(*kind, &sub.source_id).await;
            }
        }
    }

    /// Compose and emit one (kind, source) immediately, honoring the
    /// emission predicate and the gate. Returns the emitted record.
    pub async fn tick_now(&self, kind: MessageKind, source_id: &str) -> Option<ComposedMessage> {
        self.inner.tick(kind, source_id).await
    }

    /// Start periodic emission into `sink`.
    pub async fn start(&self, sink: Arc<dyn MessageSink>) -> Result<()> {
        let mut scheduler = self.scheduler.lock().await;
        if !scheduler.is_empty() {
            return Err(Error::AlreadyRunning);
        }
        *self.inner.sink.write().await = Some(sink);

        for device_kind in [DeviceKind::Battery, DeviceKind::Engine] {
            for mapping in self.inner.table.of_kind(device_kind) {
                for kind in MessageKind::for_device(device_kind) {
                    let kind = *kind;
                    let inner = self.inner.clone();
                    let source_id = mapping.source_id.clone();
                    scheduler.spawn(
                        source_id.clone(),
                        kind,
                        self.inner.config.interval(kind),
                        move || {
                            let inner = inner.clone();
                            let source_id = source_id.clone();
                            async move {
                                inner.tick(kind, &source_id).await;
                            }
                        },
                    );
                }
            }
        }

        tracing::info!(
            devices = self.inner.table.len(),
            tasks = scheduler.len(),
            "conversion engine started"
        );
        Ok(())
    }

    /// Stop all periodic tasks and discard cache and rate state.
    pub async fn stop(&self) {
        self.scheduler.lock().await.stop();
        *self.inner.sink.write().await = None;

        let mut state = self.inner.state.write().await;
        for cache in state.caches.values_mut() {
            cache.clear();
        }
        state.gate.clear();
        tracing::info!("conversion engine stopped");
    }
}
