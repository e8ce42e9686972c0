use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    payload: Vec<u8>,
    stored_at: Instant,
}

/// Short-TTL cache for serialized search responses.
///
/// Entries are invalidated purely by expiry; the engine does not own
/// ingestion, so there is no write-side invalidation. Concurrent requests
/// for the same key may both miss and both execute; an occasional
/// duplicate query is accepted instead of a single-flight lock.
pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached payload if the entry is still live. A poisoned
    /// lock degrades to a miss.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Stores a payload, dropping expired entries while the write lock is
    /// held so the map stays bounded by the live working set.
    pub fn put(&self, key: String, payload: Vec<u8>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
            entries.insert(
                key,
                CacheEntry {
                    payload,
                    stored_at: Instant::now(),
                },
            );
        }
    }
}
