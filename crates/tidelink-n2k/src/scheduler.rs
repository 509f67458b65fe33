//! Periodic emission scheduler.
//!
//! Owns one cancellable task per (source, message kind) pair. Each task
//! ticks at its kind's mandated interval and runs a composition pass
//! against the current cache contents, whether or not new telemetry
//! arrived since the last tick. `stop()` aborts every task
//! deterministically; there is no process-wide timer bookkeeping.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::message::MessageKind;

struct ScheduledTask {
    source_id: String,
    kind: MessageKind,
    handle: JoinHandle<()>,
}

/// Owned collection of periodic emission tasks.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a periodic task for one (source, kind) pair.
    ///
    /// The first tick fires one full period after spawn; `tick` runs on
    /// every subsequent period boundary.
    pub fn spawn<F, Fut>(
        &mut self,
        source_id: impl Into<String>,
        kind: MessageKind,
        period: std::time::Duration,
        mut tick: F,
    ) where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let source_id = source_id.into();
        let task_source = source_id.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The immediate first tick; real ticks follow at period.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tick().await;
            }
        });
        tracing::debug!(source = %task_source, kind = %kind, period_ms = period.as_millis() as u64, "scheduled emission task");
        self.tasks.push(ScheduledTask {
            source_id,
            kind,
            handle,
        });
    }

    /// Abort every task.
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.handle.abort();
            tracing::debug!(source = %task.source_id, kind = %task.kind, "emission task stopped");
        }
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are scheduled.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
