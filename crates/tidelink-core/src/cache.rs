//! Last-known-value cache with read-side staleness.
//!
//! One [`ValueCache`] serves one logical source (a battery or an
//! engine). Writes keep the most recent finite value per path; reads
//! apply a caller-supplied time-to-live, so an entry older than its TTL
//! behaves exactly like an absent one. Expired entries are not deleted:
//! stale-but-valid data is preferred over erasing it, and a later fresh
//! read may follow a TTL override change.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::sample::Sample;

#[derive(Debug, Clone, Copy)]
struct CachedEntry {
    value: f64,
    updated: Instant,
}

/// Per-source cache of the most recent finite value for each path.
#[derive(Debug, Default)]
pub struct ValueCache {
    entries: HashMap<String, CachedEntry>,
}

impl ValueCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sample under `key`, stamped with `now`.
    ///
    /// Absent samples never overwrite a previously cached value.
    /// Returns `true` if the entry was written.
    pub fn update(&mut self, key: &str, sample: Sample, now: Instant) -> bool {
        match sample.value() {
            Some(value) => {
                self.entries
                    .insert(key.to_string(), CachedEntry { value, updated: now });
                true
            }
            None => {
                tracing::trace!(key, "absent sample ignored");
                false
            }
        }
    }

    /// Read the cached value for `key` if it is no older than `ttl`.
    ///
    /// No side effects: an expired entry is skipped, not removed.
    pub fn read(&self, key: &str, ttl: Duration, now: Instant) -> Option<f64> {
        let entry = self.entries.get(key)?;
        if now.duration_since(entry.updated) <= ttl {
            Some(entry.value)
        } else {
            None
        }
    }

    /// When `key` was last written, regardless of freshness.
    pub fn last_updated(&self, key: &str) -> Option<Instant> {
        self.entries.get(key).map(|e| e.updated)
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn fresh_value_is_readable() {
        let mut cache = ValueCache::new();
        let now = Instant::now();
        assert!(cache.update("voltage", Sample::Present(12.5), now));
        assert_eq!(cache.read("voltage", TTL, now), Some(12.5));
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let mut cache = ValueCache::new();
        let t0 = Instant::now();
        cache.update("voltage", Sample::Present(12.5), t0);

        let later = t0 + Duration::from_secs(61);
        assert_eq!(cache.read("voltage", TTL, later), None);
        // Entry survives; a longer TTL still sees it.
        assert_eq!(cache.read("voltage", Duration::from_secs(120), later), Some(12.5));
    }

    #[test]
    fn absent_sample_does_not_erase() {
        let mut cache = ValueCache::new();
        let now = Instant::now();
        cache.update("current", Sample::Present(23.1), now);
        assert!(!cache.update("current", Sample::Absent, now));
        assert_eq!(cache.read("current", TTL, now), Some(23.1));
    }

    #[test]
    fn missing_key_is_absent() {
        let cache = ValueCache::new();
        assert_eq!(cache.read("nope", TTL, Instant::now()), None);
    }

    #[test]
    fn age_boundary_is_inclusive() {
        let mut cache = ValueCache::new();
        let t0 = Instant::now();
        cache.update("temp", Sample::Present(290.15), t0);
        assert_eq!(cache.read("temp", TTL, t0 + TTL), Some(290.15));
    }
}
