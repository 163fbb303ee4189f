//! Shared cache instances

use crate::cache::DiskLruCache;
use crate::codec::{PayloadCodec, RawBytes};
use crate::error::Result;
use crate::storage::StorageCapabilities;
use crate::types::CacheConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Hands out one shared cache per directory.
///
/// Two caches on the same directory would each believe they own its files,
/// so the registry lock is held while a cache is opened and every caller
/// asking for that directory gets the same `Arc`.
pub struct CacheFactory<C: PayloadCodec + Clone = RawBytes> {
    storage: Arc<dyn StorageCapabilities>,
    codec: C,
    instances: Mutex<HashMap<PathBuf, Arc<DiskLruCache<C>>>>,
}

impl<C: PayloadCodec + Clone> CacheFactory<C> {
    pub fn new(storage: Arc<dyn StorageCapabilities>, codec: C) -> Self {
        Self {
            storage,
            codec,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cache for `cache_dir`, opening it on first use.
    ///
    /// If the directory is already open with different limits, the existing
    /// instance is returned unchanged.
    pub async fn open(
        &self,
        cache_dir: impl AsRef<Path>,
        config: CacheConfig,
    ) -> Result<Arc<DiskLruCache<C>>> {
        let cache_dir = cache_dir.as_ref();
        let mut instances = self.instances.lock().await;

        if let Ok(canonical) = tokio::fs::canonicalize(cache_dir).await {
            if let Some(existing) = instances.get(&canonical) {
                if existing.config() != &config {
                    warn!(
                        cache_dir = ?canonical,
                        "Cache already open with a different configuration, reusing it"
                    );
                }
                return Ok(existing.clone());
            }
        }

        let cache = Arc::new(
            DiskLruCache::open(cache_dir, config, self.codec.clone(), self.storage.as_ref()).await?,
        );
        debug!(cache_dir = ?cache.cache_dir(), "Registered cache instance");
        instances.insert(cache.cache_dir().to_path_buf(), cache.clone());
        Ok(cache)
    }

    /// Open a cache named `unique_name` in the directory chosen by the
    /// storage capabilities
    pub async fn open_named(
        &self,
        unique_name: &str,
        config: CacheConfig,
    ) -> Result<Arc<DiskLruCache<C>>> {
        let cache_dir = self.storage.resolve_cache_dir(unique_name);
        self.open(cache_dir, config).await
    }

    pub async fn instance_count(&self) -> usize {
        self.instances.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::tempdir;

    fn factory_in(dir: &Path) -> CacheFactory {
        let storage = LocalStorage::with_dirs(Some(dir.to_path_buf()), dir.to_path_buf());
        CacheFactory::new(Arc::new(storage), RawBytes)
    }

    #[tokio::test]
    async fn test_same_directory_shares_instance() {
        let dir = tempdir().unwrap();
        let factory = factory_in(dir.path());
        let cache_dir = dir.path().join("images");

        let first = factory.open(&cache_dir, CacheConfig::new(1024, 8)).await.unwrap();
        let second = factory.open(&cache_dir, CacheConfig::new(1024, 8)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.instance_count().await, 1);

        first.put("k", &b"v".to_vec()).await;
        assert_eq!(second.get("k").await, Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_equivalent_paths_share_instance() {
        let dir = tempdir().unwrap();
        let factory = factory_in(dir.path());
        let cache_dir = dir.path().join("images");

        let first = factory.open(&cache_dir, CacheConfig::default()).await.unwrap();
        let second = factory
            .open(cache_dir.join("..").join("images"), CacheConfig::default())
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_first_configuration_wins() {
        let dir = tempdir().unwrap();
        let factory = factory_in(dir.path());
        let cache_dir = dir.path().join("images");

        let first = factory.open(&cache_dir, CacheConfig::new(1024, 8)).await.unwrap();
        let second = factory.open(&cache_dir, CacheConfig::new(2048, 16)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config().max_bytes, 1024);
        assert_eq!(second.config().max_items, 8);
    }

    #[tokio::test]
    async fn test_distinct_directories_get_distinct_instances() {
        let dir = tempdir().unwrap();
        let factory = factory_in(dir.path());

        let thumbs = factory.open_named("thumbs", CacheConfig::default()).await.unwrap();
        let full = factory.open_named("full", CacheConfig::default()).await.unwrap();

        assert!(!Arc::ptr_eq(&thumbs, &full));
        assert_eq!(thumbs.cache_dir(), std::fs::canonicalize(dir.path().join("thumbs")).unwrap());
        assert_eq!(factory.instance_count().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_open_builds_one_instance() {
        let dir = tempdir().unwrap();
        let factory = Arc::new(factory_in(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = factory.clone();
                tokio::spawn(async move {
                    factory
                        .open_named("shared", CacheConfig::default())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let caches: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert!(caches.iter().all(|c| Arc::ptr_eq(c, &caches[0])));
        assert_eq!(factory.instance_count().await, 1);
    }

    #[tokio::test]
    async fn test_open_failure_registers_nothing() {
        let dir = tempdir().unwrap();
        let factory = factory_in(dir.path());
        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();

        assert!(factory.open(&file, CacheConfig::default()).await.is_err());
        assert_eq!(factory.instance_count().await, 0);
    }
}
