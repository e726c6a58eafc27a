// src/cache.rs

//! Credential-keyed TTL cache for scrape results.
//!
//! Scraping a portal costs a full browser login, so successful results are
//! kept warm for a day by default. Keys are credential digests (see
//! [`crate::models::Credential::cache_key`]), never raw credentials.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::CacheConfig;

struct CacheEntry<T> {
    value: T,
    created_at: Instant,
}

/// A bounded in-memory cache with per-entry TTL.
pub struct ResultCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<T: Clone> ResultCache<T> {
    /// Create a cache with the given entry lifetime and capacity.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Create a cache from the application configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    /// Look up a fresh entry. Expired entries are dropped on access.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value, evicting the oldest entries beyond capacity.
    pub fn put(&self, key: impl Into<String>, value: T) {
        let mut entries = self.lock();
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
        while entries.len() > self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => entries.remove(&key),
                None => break,
            };
        }
    }

    /// Drop a single entry.
    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including any not yet expired-on-access.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself stays usable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_secs: u64, max_entries: usize) -> ResultCache<String> {
        ResultCache::new(Duration::from_secs(ttl_secs), max_entries)
    }

    #[test]
    fn hit_within_ttl() {
        let cache = cache(60, 10);
        cache.put("k1", "value".to_string());
        assert_eq!(cache.get("k1").as_deref(), Some("value"));
    }

    #[test]
    fn miss_for_unknown_key() {
        let cache = cache(60, 10);
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = ResultCache::new(Duration::ZERO, 10);
        cache.put("k1", "value".to_string());
        assert_eq!(cache.get("k1"), None);
        // Expired entries are removed on access.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn expiry_over_time() {
        let cache = ResultCache::new(Duration::from_millis(20), 10);
        cache.put("k1", "value".to_string());
        assert!(cache.get("k1").is_some());
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("k1"), None);
    }

    #[test]
    fn overwrites_keep_latest_value() {
        let cache = cache(60, 10);
        cache.put("k1", "old".to_string());
        cache.put("k1", "new".to_string());
        assert_eq!(cache.get("k1").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let cache = cache(60, 2);
        cache.put("first", "1".to_string());
        std::thread::sleep(Duration::from_millis(5));
        cache.put("second", "2".to_string());
        std::thread::sleep(Duration::from_millis(5));
        cache.put("third", "3".to_string());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("first"), None);
        assert!(cache.get("second").is_some());
        assert!(cache.get("third").is_some());
    }

    #[test]
    fn remove_and_clear() {
        let cache = cache(60, 10);
        cache.put("k1", "1".to_string());
        cache.put("k2", "2".to_string());
        cache.remove("k1");
        assert_eq!(cache.get("k1"), None);
        assert!(cache.get("k2").is_some());
        cache.clear();
        assert!(cache.is_empty());
    }
}
