//! Disk-backed LRU cache engine

use crate::codec::{PayloadCodec, RawBytes};
use crate::error::{CacheError, CodecError, Result};
use crate::index::CacheIndex;
use crate::key::KeyCodec;
use crate::policy::EvictionPolicy;
use crate::storage::StorageCapabilities;
use crate::types::{CacheConfig, CacheEntry, CacheStats};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Everything guarded by the cache lock
struct CacheState {
    index: CacheIndex,
    /// Encoded keys whose payload is being written outside the lock
    pending: HashSet<String>,
}

/// Result of listing the cache directory at open
struct DirScan {
    entries: Vec<CacheEntry>,
    foreign_bytes: u64,
}

/// A cache of payloads stored as one file per key in a flat directory.
///
/// The index, its byte total and the set of in-flight writes live behind a
/// single mutex. Payload bytes are read and written outside of it; a new
/// entry becomes visible only after its file has been written.
///
/// The filesystem is the source of truth. A file that exists on disk but is
/// missing from the index is adopted on the next lookup, and an index entry
/// whose file has gone is dropped on the next read.
pub struct DiskLruCache<C: PayloadCodec = RawBytes> {
    cache_dir: PathBuf,
    config: CacheConfig,
    keys: KeyCodec,
    policy: EvictionPolicy,
    codec: C,
    state: Mutex<CacheState>,
    foreign_bytes: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<C: PayloadCodec> DiskLruCache<C> {
    /// Open (creating if needed) the cache in `cache_dir` and rebuild its
    /// index from the files already there, oldest modification time first.
    ///
    /// Only files carrying the cache prefix count towards the byte total;
    /// anything else in the directory is reported as `foreign_bytes`.
    pub async fn open(
        cache_dir: impl Into<PathBuf>,
        config: CacheConfig,
        codec: C,
        storage: &dyn StorageCapabilities,
    ) -> Result<Self> {
        if config.eviction_budget == 0 {
            return Err(CacheError::InvalidConfig(
                "eviction_budget must be at least 1".to_string(),
            ));
        }

        let cache_dir = prepare_dir(&cache_dir.into()).await?;

        let available = storage.usable_space(&cache_dir)?;
        if available <= config.max_bytes {
            return Err(CacheError::InsufficientSpace {
                path: cache_dir,
                available,
                required: config.max_bytes,
            });
        }

        let keys = KeyCodec::new(config.file_prefix.clone());
        let scan = scan_dir(&cache_dir, &keys).await?;

        let mut index = CacheIndex::new();
        for entry in scan.entries {
            index.put(entry.encoded_key.clone(), entry);
        }

        info!(
            cache_dir = ?cache_dir,
            entries = index.len(),
            total_bytes = index.total_bytes(),
            max_items = config.max_items,
            max_bytes = config.max_bytes,
            "Cache opened"
        );
        if scan.foreign_bytes > 0 {
            warn!(
                cache_dir = ?cache_dir,
                foreign_bytes = scan.foreign_bytes,
                "Cache directory contains files not managed by the cache"
            );
        }

        let policy = EvictionPolicy::new(config.max_items, config.max_bytes, config.eviction_budget);

        Ok(Self {
            cache_dir,
            config,
            keys,
            policy,
            codec,
            state: Mutex::new(CacheState {
                index,
                pending: HashSet::new(),
            }),
            foreign_bytes: scan.foreign_bytes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a payload from the cache
    pub async fn get(&self, key: &str) -> Option<C::Value> {
        let encoded = self.keys.encode(key);

        let entry = {
            let mut state = self.state.lock().await;
            self.lookup_or_adopt(&mut state, key, &encoded).await
        };

        let Some(entry) = entry else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache miss");
            return None;
        };

        let bytes = match fs::read(&entry.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cached file, dropping entry");
                self.forget(&entry, false).await;
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match self.codec.decode(bytes) {
            Ok(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(CodecError::ResourceExhausted(msg)) => {
                error!(key, error = %msg, "Out of resources decoding cached payload");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                warn!(key, error = %e, "Cached payload is corrupt, removing entry");
                self.forget(&entry, true).await;
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Whether a payload is cached for `key`, without reading it
    pub async fn contains_key(&self, key: &str) -> bool {
        let encoded = self.keys.encode(key);
        let mut state = self.state.lock().await;
        if let Some(entry) = state.index.peek(&encoded) {
            return self.check_indexed(&mut state, entry).await.is_some();
        }
        self.lookup_or_adopt(&mut state, key, &encoded)
            .await
            .is_some()
    }

    /// Store a payload unless one is already cached for `key`.
    ///
    /// The first write for a key wins; later puts for the same key are
    /// no-ops. Failures are logged and leave the cache unchanged.
    pub async fn put(&self, key: &str, value: &C::Value) {
        let encoded = self.keys.encode(key);

        {
            let mut state = self.state.lock().await;
            if self
                .lookup_or_adopt(&mut state, key, &encoded)
                .await
                .is_some()
            {
                debug!(key, "Already cached, keeping first write");
                return;
            }
            if !state.pending.insert(encoded.clone()) {
                debug!(key, "Write already in progress");
                return;
            }
        }

        let path = self.keys.file_path(&self.cache_dir, &encoded);
        let written = self.write_payload(key, &path, value).await;

        let mut state = self.state.lock().await;
        state.pending.remove(&encoded);

        if let Some(size) = written {
            let entry = CacheEntry {
                key: key.to_string(),
                encoded_key: encoded.clone(),
                path,
                size,
                modified: Utc::now(),
            };
            state.index.put(encoded, entry);
            debug!(key, size, "Cached payload");
            self.flush_locked(&mut state).await;
        }
    }

    /// Remove the entry for `key` and delete its file.
    ///
    /// Returns true if an entry or file was removed. A key whose payload is
    /// still being written is left alone.
    pub async fn remove(&self, key: &str) -> bool {
        let encoded = self.keys.encode(key);
        let mut state = self.state.lock().await;

        if state.pending.contains(&encoded) {
            debug!(key, "Not removing entry with a write in progress");
            return false;
        }

        let (path, indexed) = match state.index.remove(&encoded) {
            Some(entry) => (entry.path, true),
            None => (self.keys.file_path(&self.cache_dir, &encoded), false),
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "Removed cache entry");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => indexed,
            Err(e) => {
                warn!(key, error = %e, "Failed to delete cache file");
                indexed
            }
        }
    }

    /// Evict least recently used entries while over either limit, at most
    /// `eviction_budget` of them. Returns the number evicted.
    pub async fn flush(&self) -> usize {
        let mut state = self.state.lock().await;
        self.flush_locked(&mut state).await
    }

    /// Delete every cache file in the directory and empty the index.
    ///
    /// Files without the cache prefix are left alone. Returns the number of
    /// files deleted.
    pub async fn clear_cache(&self) -> usize {
        let mut state = self.state.lock().await;
        state.index.clear();

        let mut read_dir = match fs::read_dir(&self.cache_dir).await {
            Ok(read_dir) => read_dir,
            Err(e) => {
                warn!(cache_dir = ?self.cache_dir, error = %e, "Failed to list cache directory");
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let item = match read_dir.next_entry().await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) => {
                    warn!(cache_dir = ?self.cache_dir, error = %e, "Failed to list cache directory");
                    break;
                }
            };

            let file_name = item.file_name();
            let Some(encoded) = file_name.to_str().and_then(|n| self.keys.strip_prefix(n)) else {
                continue;
            };
            if state.pending.contains(encoded) {
                continue;
            }
            match fs::remove_file(item.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = ?item.path(), error = %e, "Failed to delete cache file"),
            }
        }

        info!(cache_dir = ?self.cache_dir, removed, "Cache cleared");
        removed
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.index.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.index.is_empty()
    }

    pub async fn total_bytes(&self) -> u64 {
        self.state.lock().await.index.total_bytes()
    }

    /// Encoded keys from least to most recently used
    pub async fn keys_oldest_first(&self) -> Vec<String> {
        self.state.lock().await.index.keys_oldest_first()
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            entries: state.index.len(),
            total_size: state.index.total_bytes(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            foreign_bytes: self.foreign_bytes,
        }
    }

    /// Index lookup that drops entries whose file has gone and falls back
    /// to adopting an existing file
    async fn lookup_or_adopt(
        &self,
        state: &mut CacheState,
        key: &str,
        encoded: &str,
    ) -> Option<CacheEntry> {
        if let Some(entry) = state.index.get(encoded) {
            return self.check_indexed(state, entry).await;
        }
        if state.pending.contains(encoded) {
            return None;
        }

        let path = self.keys.file_path(&self.cache_dir, encoded);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return None,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(key, error = %e, "Failed to stat cache file");
                }
                return None;
            }
        };

        let entry = CacheEntry {
            key: key.to_string(),
            encoded_key: encoded.to_string(),
            path,
            size: metadata.len(),
            modified: modified_time(&metadata),
        };
        debug!(key, size = entry.size, "Adopted cache file missing from index");
        state.index.put(encoded.to_string(), entry.clone());
        Some(entry)
    }

    /// Keep an indexed entry only while its file still exists
    async fn check_indexed(&self, state: &mut CacheState, entry: CacheEntry) -> Option<CacheEntry> {
        match fs::metadata(&entry.path).await {
            Ok(metadata) if metadata.is_file() => Some(entry),
            Err(e) if e.kind() != ErrorKind::NotFound => {
                warn!(key = %entry.key, error = %e, "Failed to stat cache file");
                Some(entry)
            }
            _ => {
                debug!(key = %entry.key, "Cache file has gone, dropping entry");
                state.index.remove(&entry.encoded_key);
                None
            }
        }
    }

    /// Drop `entry` after a failed read, unless the key has since been
    /// evicted or written again
    async fn forget(&self, entry: &CacheEntry, delete_file: bool) {
        let mut state = self.state.lock().await;
        if state.index.peek(&entry.encoded_key).as_ref() != Some(entry) {
            debug!(key = %entry.key, "Entry replaced since it was read, keeping it");
            return;
        }
        state.index.remove(&entry.encoded_key);
        if delete_file {
            remove_file_logged(&entry.path).await;
        }
    }

    async fn write_payload(&self, key: &str, path: &Path, value: &C::Value) -> Option<u64> {
        let bytes = match self.codec.encode(value) {
            Ok(bytes) => bytes,
            Err(CodecError::ResourceExhausted(msg)) => {
                error!(key, error = %msg, "Out of resources encoding payload");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to encode payload");
                return None;
            }
        };

        match fs::write(path, &bytes).await {
            Ok(()) => Some(bytes.len() as u64),
            Err(e) => {
                warn!(key, path = ?path, error = %e, "Failed to write cache file");
                remove_file_logged(path).await;
                None
            }
        }
    }

    async fn flush_locked(&self, state: &mut CacheState) -> usize {
        let mut evicted = 0;
        while evicted < self.policy.eviction_budget()
            && self
                .policy
                .should_evict(state.index.len(), state.index.total_bytes())
        {
            let Some(eldest) = state.index.remove_oldest() else {
                break;
            };
            remove_file_logged(&eldest.path).await;
            evicted += 1;
            debug!(key = %eldest.key, size = eldest.size, "Evicted least recently used entry");
        }

        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        }
        evicted
    }
}

/// Create the directory if needed and check it can hold cache files
async fn prepare_dir(dir: &Path) -> Result<PathBuf> {
    let not_writable = |reason: String| CacheError::NotWritable {
        path: dir.to_path_buf(),
        reason,
    };

    fs::create_dir_all(dir)
        .await
        .map_err(|e| not_writable(e.to_string()))?;
    let metadata = fs::metadata(dir)
        .await
        .map_err(|e| not_writable(e.to_string()))?;

    if !metadata.is_dir() {
        return Err(not_writable("not a directory".to_string()));
    }
    if metadata.permissions().readonly() {
        return Err(not_writable("directory is read-only".to_string()));
    }
    check_writable(dir)
        .await
        .map_err(|e| not_writable(e.to_string()))?;

    fs::canonicalize(dir)
        .await
        .map_err(|e| not_writable(e.to_string()))
}

/// Create and delete a scratch file in `dir`
async fn check_writable(dir: &Path) -> std::io::Result<()> {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let path = dir.join(format!(".write-check-{}-{}", std::process::id(), nanos));

    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await?;
    remove_file_logged(&path).await;
    Ok(())
}

async fn scan_dir(dir: &Path, keys: &KeyCodec) -> Result<DirScan> {
    let mut entries = Vec::new();
    let mut foreign_bytes = 0;

    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(item) = read_dir.next_entry().await? {
        let metadata = match item.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = ?item.path(), error = %e, "Skipping unreadable file");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let file_name = item.file_name();
        match file_name.to_str().and_then(|n| keys.strip_prefix(n)) {
            Some(encoded) => entries.push(CacheEntry {
                key: keys.decode(encoded),
                encoded_key: encoded.to_string(),
                path: item.path(),
                size: metadata.len(),
                modified: modified_time(&metadata),
            }),
            None => foreign_bytes += metadata.len(),
        }
    }

    entries.sort_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| a.encoded_key.cmp(&b.encoded_key))
    });

    Ok(DirScan {
        entries,
        foreign_bytes,
    })
}

fn modified_time(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

async fn remove_file_logged(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = ?path, error = %e, "Failed to delete cache file");
        }
    }
}
