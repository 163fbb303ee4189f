//! Access-ordered index of cached files

use crate::types::CacheEntry;
use lru::LruCache;

/// Maps encoded keys to entries in recency order and tracks their total size.
///
/// The underlying map is unbounded; limits are enforced by the owner through
/// [`EvictionPolicy`](crate::EvictionPolicy). Callers must hold the cache lock.
pub struct CacheIndex {
    entries: LruCache<String, CacheEntry>,
    total_bytes: u64,
}

impl CacheIndex {
    pub fn new() -> Self {
        Self {
            entries: LruCache::unbounded(),
            total_bytes: 0,
        }
    }

    /// Look up an entry and mark it most recently used
    pub fn get(&mut self, encoded_key: &str) -> Option<CacheEntry> {
        self.entries.get(encoded_key).cloned()
    }

    /// Look up an entry without changing the recency order
    pub fn peek(&self, encoded_key: &str) -> Option<CacheEntry> {
        self.entries.peek(encoded_key).cloned()
    }

    /// Presence check that leaves the recency order untouched
    pub fn contains(&self, encoded_key: &str) -> bool {
        self.entries.contains(encoded_key)
    }

    /// Insert or replace at the most recently used position.
    ///
    /// Returns the size of the replaced entry, or 0.
    pub fn put(&mut self, encoded_key: String, entry: CacheEntry) -> u64 {
        let size = entry.size;
        let previous = self.entries.put(encoded_key, entry).map_or(0, |old| old.size);
        self.total_bytes = self.total_bytes - previous + size;
        previous
    }

    pub fn remove(&mut self, encoded_key: &str) -> Option<CacheEntry> {
        let entry = self.entries.pop(encoded_key)?;
        self.total_bytes -= entry.size;
        Some(entry)
    }

    /// Pop the least recently used entry; `None` when the index is empty
    pub fn remove_oldest(&mut self) -> Option<CacheEntry> {
        let (_, entry) = self.entries.pop_lru()?;
        self.total_bytes -= entry.size;
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Encoded keys from least to most recently used
    pub fn keys_oldest_first(&self) -> Vec<String> {
        self.entries.iter().rev().map(|(k, _)| k.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }
}

impl Default for CacheIndex {
    fn default() -> Self {
        Self::new()
    }
}
