//! # Read Cache
//!
//! Short-TTL cache for the sale listing endpoint. Best effort: entries
//! expire after a fixed TTL and the cache is never consulted inside a write
//! transaction. Injected per server instance, so tests get their own and
//! shutdown is clean.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

/// Key → (value, stored-at) map with a fixed TTL.
#[derive(Debug)]
pub struct ReadCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Value, Instant)>>,
}

impl ReadCache {
    /// Creates a cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        ReadCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value when present and fresh. Expired entries are
    /// evicted on the way out.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");

        match entries.get(key) {
            Some((value, stored_at)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a value under the key.
    pub fn put(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.to_string(), (value, Instant::now()));
    }

    /// Drops every entry (used after writes in tests).
    pub fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_within_ttl() {
        let cache = ReadCache::new(Duration::from_secs(30));
        cache.put("k", json!({"data": [1, 2, 3]}));

        assert_eq!(cache.get("k"), Some(json!({"data": [1, 2, 3]})));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn test_expiry() {
        let cache = ReadCache::new(Duration::from_millis(0));
        cache.put("k", json!(1));

        // TTL of zero: stale immediately
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_clear() {
        let cache = ReadCache::new(Duration::from_secs(30));
        cache.put("k", json!(1));
        cache.clear();
        assert_eq!(cache.get("k"), None);
    }
}
