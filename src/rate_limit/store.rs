use std::collections::HashMap;

use parking_lot::Mutex;

use crate::models::RateLimitEntry;

/// Key-value backing for rate limit entries
///
/// An entry's `reset_at` doubles as its TTL: once it has passed, `get` must
/// behave as if the key were absent. Implementations may be process-local
/// or shared across instances.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str, now: i64) -> Option<RateLimitEntry>;
    fn set(&self, key: &str, entry: RateLimitEntry);
    fn delete(&self, key: &str);
    /// Drop every expired entry, returning how many were removed
    fn purge_expired(&self, now: i64) -> usize;
}

/// In-process store; lost on restart and not shared between instances
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl RateLimitStore for MemoryStore {
    fn get(&self, key: &str, now: i64) -> Option<RateLimitEntry> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(*entry),
            None => None,
        }
    }

    fn set(&self, key: &str, entry: RateLimitEntry) {
        self.entries.lock().insert(key.to_string(), entry);
    }

    fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    fn purge_expired(&self, now: i64) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}
