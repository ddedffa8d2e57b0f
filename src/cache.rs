use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::Clock;

/// Structured cache key for one farmer's crop-safety computation.
///
/// Device ids are sorted at construction so the same device set always
/// produces the same key regardless of caller ordering; string
/// concatenation is deliberately avoided.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ScoreCacheKey {
    pub farmer_id: String,
    pub crop_type: String,
    device_ids: Vec<String>,
}

impl ScoreCacheKey {
    pub fn new(
        farmer_id: impl Into<String>,
        crop_type: impl Into<String>,
        device_ids: &[String],
    ) -> Self {
        let mut device_ids = device_ids.to_vec();
        device_ids.sort();
        Self {
            farmer_id: farmer_id.into(),
            crop_type: crop_type.into(),
            device_ids,
        }
    }

    pub fn device_ids(&self) -> &[String] {
        &self.device_ids
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: DateTime<Utc>,
}

/// TTL-bounded memoization of crop-safety results.
///
/// An explicitly owned instance injected into the service, never a
/// module-level singleton. Entries are only ever invalidated by TTL expiry
/// or by the wholesale `clear_all` the external daily scheduler invokes;
/// staleness up to one TTL is an accepted tradeoff.
pub struct ScoreCache<V> {
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<ScoreCacheKey, CacheEntry<V>>>,
}

impl<V: Clone> ScoreCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(24)),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if present and younger than the
    /// TTL. Expired entries are dropped on the way out.
    pub fn get(&self, key: &ScoreCacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");

        match entries.get(key) {
            Some(entry) if now - entry.created_at < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: ScoreCacheKey, value: V) {
        let created_at = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key, CacheEntry { value, created_at });
    }

    /// Empty the whole cache, returning how many entries were dropped.
    /// Atomic with respect to concurrent get/put: callers never observe a
    /// half-cleared map.
    pub fn clear_all(&self) -> usize {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let cleared = entries.len();
        entries.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
