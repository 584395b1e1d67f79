//! In-process cache backend

use crate::proxy::CacheProxy;
use lru::LruCache;
use parking_lot::Mutex;
use runguard_config::CacheSettings;
use runguard_core::{Error, Result};
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct MemoryEntry {
    value: Value,
    created_at: Instant,
    ttl: Duration,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

/// Capacity-bounded map with per-entry TTL.
///
/// When full, the least recently used entry is evicted. Expired entries are
/// dropped when read or by [`MemoryCache::purge_expired`].
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::configuration("memory cache capacity must be at least 1"))?;
        Ok(Self::with_capacity(capacity))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Result<Self> {
        Self::new(settings.capacity)
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl CacheProxy for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }
        entries.pop(key);
        Ok(None)
    }

    fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        self.entries.lock().put(
            key.to_string(),
            MemoryEntry {
                value: value.clone(),
                created_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    fn backend(&self) -> &str {
        "memory"
    }

    fn is_local(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_get_set() {
        let cache = MemoryCache::new(4).unwrap();
        assert_eq!(cache.get("missing").unwrap(), None);

        cache.set("user:1", &json!({ "name": "a", "age": 1 }), MINUTE).unwrap();

        assert_eq!(cache.get("user:1").unwrap(), Some(json!({ "name": "a", "age": 1 })));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_null_is_stored() {
        let cache = MemoryCache::new(4).unwrap();

        cache.set("nothing", &Value::Null, MINUTE).unwrap();

        assert_eq!(cache.get("nothing").unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_entries_expire() {
        let cache = MemoryCache::new(4).unwrap();
        cache.set("short", &json!(1), Duration::from_millis(20)).unwrap();
        cache.set("long", &json!(2), MINUTE).unwrap();

        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("short").unwrap(), None);
        assert_eq!(cache.get("long").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_expired_entry_removed_on_read() {
        let cache = MemoryCache::new(4).unwrap();
        cache.set("gone", &json!("x"), Duration::from_millis(10)).unwrap();

        std::thread::sleep(Duration::from_millis(25));

        assert_eq!(cache.get("gone").unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = MemoryCache::new(2).unwrap();
        cache.set("a", &json!(1), MINUTE).unwrap();
        cache.set("b", &json!(2), MINUTE).unwrap();
        cache.get("a").unwrap();

        cache.set("c", &json!(3), MINUTE).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b").unwrap(), None);
        assert_eq!(cache.get("a").unwrap(), Some(json!(1)));
        assert_eq!(cache.get("c").unwrap(), Some(json!(3)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(MemoryCache::new(0).unwrap_err().is_configuration());
        assert_eq!(
            MemoryCache::from_settings(&CacheSettings::default())
                .unwrap()
                .capacity(),
            256
        );
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new(4).unwrap();
        cache.set("a", &json!(1), MINUTE).unwrap();

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.is_local());
        assert_eq!(cache.backend(), "memory");
    }
}
