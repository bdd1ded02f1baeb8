//! In-process response cache keyed by operation prefix plus canonical JSON
//! of the normalized request parameters.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CacheConfig;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
}

#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(config.ttl_seconds),
            max_entries: config.max_entries,
            enabled: config.enabled,
        }
    }

    pub fn disabled() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: Duration::ZERO,
            max_entries: 0,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// `prefix:{json}` with object keys in sorted order. Returns `None` when
    /// the parameters cannot be serialized, which bypasses the cache.
    pub fn build_key<P: Serialize>(prefix: &str, params: &P) -> Option<String> {
        let canonical = serde_json::to_value(params).and_then(|v| serde_json::to_string(&v));
        match canonical {
            Ok(json) => Some(format!("{}:{}", prefix, json)),
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "Failed to build cache key, bypassing cache");
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        let hit = self.entries.get(key).and_then(|entry| {
            (entry.inserted_at.elapsed() < self.ttl).then(|| entry.value.clone())
        });
        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        }
        hit
    }

    pub fn insert(&self, key: String, value: Value) {
        if !self.enabled || self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict();
        }
        self.entries.insert(key, CacheEntry { value, inserted_at: Instant::now() });
    }

    /// Drop expired entries; if still full, drop the oldest one.
    fn evict(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        if self.entries.len() < self.max_entries {
            return;
        }
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    /// Return the cached value for `key` or compute, store and return a fresh
    /// one. Any cache-side failure falls back to the computed result.
    pub fn get_or_compute<T, E, F>(&self, key: Option<&str>, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        let Some(key) = key.filter(|_| self.enabled) else {
            return compute();
        };

        if let Some(value) = self.get(key) {
            match serde_json::from_value::<T>(value) {
                Ok(cached) => {
                    debug!(key = %key, "Cache hit");
                    return Ok(cached);
                }
                Err(e) => warn!(key = %key, error = %e, "Cached value unreadable, recomputing"),
            }
        } else {
            debug!(key = %key, "Cache miss");
        }

        let fresh = compute()?;
        match serde_json::to_value(&fresh) {
            Ok(value) => self.insert(key.to_string(), value),
            Err(e) => warn!(key = %key, error = %e, "Failed to store response in cache"),
        }
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn cache(ttl_seconds: u64, max_entries: usize) -> ResponseCache {
        ResponseCache::new(&CacheConfig { enabled: true, ttl_seconds, max_entries })
    }

    #[test]
    fn test_build_key_sorts_object_keys() {
        let a = ResponseCache::build_key("costs", &json!({"b": 1, "a": [2, 3]})).unwrap();
        let b = ResponseCache::build_key("costs", &json!({"a": [2, 3], "b": 1})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "costs:{\"a\":[2,3],\"b\":1}");
    }

    #[test]
    fn test_get_or_compute_memoizes() {
        let cache = cache(60, 10);
        let calls = Cell::new(0);
        let compute = || -> Result<Vec<i32>, String> {
            calls.set(calls.get() + 1);
            Ok(vec![1, 2, 3])
        };

        let first = cache.get_or_compute(Some("k"), compute).unwrap();
        let second = cache.get_or_compute(Some("k"), compute).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_disabled_cache_always_computes() {
        let cache = ResponseCache::disabled();
        let calls = Cell::new(0);
        for _ in 0..3 {
            let _: Result<i32, String> = cache.get_or_compute(Some("k"), || {
                calls.set(calls.get() + 1);
                Ok(1)
            });
        }
        assert_eq!(calls.get(), 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_key_bypasses_cache() {
        let cache = cache(60, 10);
        let value: Result<i32, String> = cache.get_or_compute(None, || Ok(7));
        assert_eq!(value.unwrap(), 7);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = cache(60, 10);
        let err: Result<i32, String> = cache.get_or_compute(Some("k"), || Err("boom".to_string()));
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_ignored() {
        let cache = cache(0, 10);
        cache.insert("k".into(), json!(1));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_bounded_by_max_entries() {
        let cache = cache(60, 2);
        cache.insert("a".into(), json!(1));
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("b".into(), json!(2));
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("c".into(), json!(3));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("c").is_some());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_unreadable_cached_value_recomputes() {
        let cache = cache(60, 10);
        cache.insert("k".into(), json!("not a number"));
        let value: Result<i32, String> = cache.get_or_compute(Some("k"), || Ok(5));
        assert_eq!(value.unwrap(), 5);
        assert_eq!(cache.get("k"), Some(json!(5)));
    }
}
