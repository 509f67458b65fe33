//! Minimum inter-emission interval gate.
//!
//! Keyed by an opaque pair (typically protocol instance + message
//! kind). The first call for a key always passes and records its time.
//! A denied call leaves the window untouched, so bursts above the rate
//! are fully suppressed rather than queued or coalesced.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Per-key gate enforcing a minimum time between successful calls.
#[derive(Debug)]
pub struct EmissionGate<K> {
    last_allowed: HashMap<K, Instant>,
}

impl<K: Eq + Hash> EmissionGate<K> {
    /// Create an empty gate.
    pub fn new() -> Self {
        Self {
            last_allowed: HashMap::new(),
        }
    }

    /// Whether an emission for `key` may proceed at `now`.
    ///
    /// Passes when no successful call has been recorded for `key`, or
    /// when at least `interval` has elapsed since the last successful
    /// call. Only a passing call advances the window.
    pub fn allow(&mut self, key: K, interval: Duration, now: Instant) -> bool {
        match self.last_allowed.get(&key) {
            Some(&last) if now.duration_since(last) < interval => false,
            _ => {
                self.last_allowed.insert(key, now);
                true
            }
        }
    }

    /// Forget the window for one key.
    pub fn reset(&mut self, key: &K) {
        self.last_allowed.remove(key);
    }

    /// Forget all windows.
    pub fn clear(&mut self) {
        self.last_allowed.clear();
    }

    /// Number of keys with a recorded window.
    pub fn len(&self) -> usize {
        self.last_allowed.len()
    }

    /// Whether no key has a recorded window.
    pub fn is_empty(&self) -> bool {
        self.last_allowed.is_empty()
    }
}

impl<K: Eq + Hash> Default for EmissionGate<K> {
    fn default() -> Self {
        Self::new()
    }
}
