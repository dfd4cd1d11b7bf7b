//! Response store implementations.
//!
//! Entries hold the serialized canonical body exactly as it was sent to the
//! first caller. Staleness is a pure function of the entry's age and the TTL;
//! stale entries are never returned and are removed lazily on read or by
//! [`ResponseStore::purge_stale`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: Bytes,
    pub stored_at: Instant,
}

impl CacheEntry {
    pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) >= ttl
    }
}

/// Process-local storage for serialized responses.
pub trait ResponseStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;
    fn put(&self, key: CacheKey, payload: Bytes);
    fn clear(&self);
    /// Removes stale entries and returns how many were dropped.
    fn purge_stale(&self) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store with a fixed TTL.
pub struct MemoryStore {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<CacheEntry> {
        {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(key) {
                Some(entry) if !entry.is_stale(now, self.ttl) => return Some(entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = rw_write(&self.entries, SOURCE, "get.evict_stale");
        if entries
            .get(key)
            .is_some_and(|entry| entry.is_stale(now, self.ttl))
        {
            entries.remove(key);
        }
        None
    }

    pub fn put_at(&self, key: CacheKey, payload: Bytes, now: Instant) {
        let entry = CacheEntry {
            key: key.clone(),
            payload,
            stored_at: now,
        };
        rw_write(&self.entries, SOURCE, "put").insert(key, entry);
    }

    pub fn purge_stale_at(&self, now: Instant) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "purge_stale");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_stale(now, self.ttl));
        before - entries.len()
    }
}

impl ResponseStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.get_at(key, Instant::now())
    }

    fn put(&self, key: CacheKey, payload: Bytes) {
        self.put_at(key, payload, Instant::now());
    }

    fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    fn purge_stale(&self) -> usize {
        self.purge_stale_at(Instant::now())
    }

    fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }
}

/// Store used when caching is switched off: every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

impl ResponseStore for DisabledStore {
    fn get(&self, _key: &CacheKey) -> Option<CacheEntry> {
        None
    }

    fn put(&self, _key: CacheKey, _payload: Bytes) {}

    fn clear(&self) {}

    fn purge_stale(&self) -> usize {
        0
    }

    fn len(&self) -> usize {
        0
    }
}

/// Builds the store selected by configuration.
pub fn build_store(config: &CacheConfig) -> Arc<dyn ResponseStore> {
    if config.enabled {
        Arc::new(MemoryStore::new(config.ttl))
    } else {
        Arc::new(DisabledStore)
    }
}
