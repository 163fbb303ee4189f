//! Storage medium queries
//!
//! The cache only consults these when a directory is resolved or opened,
//! never on individual operations.

use std::io;
use std::path::{Path, PathBuf};

/// Platform queries about where a cache can live and how much room it has
pub trait StorageCapabilities: Send + Sync {
    /// Bytes available to this process on the filesystem holding `path`
    fn usable_space(&self, path: &Path) -> io::Result<u64>;

    /// Whether the external medium can be unplugged
    fn is_removable(&self) -> bool;

    /// Whether the external medium is currently mounted
    fn is_external_mounted(&self) -> bool;

    /// Shared per-user cache location, if the platform has one
    fn external_cache_dir(&self) -> Option<PathBuf>;

    /// Private cache location that is always available
    fn internal_cache_dir(&self) -> PathBuf;

    /// Pick the directory a named cache should live in.
    ///
    /// External storage is used when it is mounted, or when it cannot be
    /// removed at all; otherwise the internal cache directory is used.
    fn resolve_cache_dir(&self, unique_name: &str) -> PathBuf {
        let base = match self.external_cache_dir() {
            Some(dir) if self.is_external_mounted() || !self.is_removable() => dir,
            _ => self.internal_cache_dir(),
        };
        base.join(unique_name)
    }
}

/// Desktop and server storage: the user cache directory on a fixed disk
#[derive(Debug, Clone)]
pub struct LocalStorage {
    external: Option<PathBuf>,
    internal: PathBuf,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self {
            external: dirs::cache_dir(),
            internal: std::env::temp_dir(),
        }
    }

    /// Use explicit directories instead of the platform defaults
    pub fn with_dirs(external: Option<PathBuf>, internal: PathBuf) -> Self {
        Self { external, internal }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageCapabilities for LocalStorage {
    fn usable_space(&self, path: &Path) -> io::Result<u64> {
        fs2::available_space(path)
    }

    fn is_removable(&self) -> bool {
        false
    }

    fn is_external_mounted(&self) -> bool {
        self.external.is_some()
    }

    fn external_cache_dir(&self) -> Option<PathBuf> {
        self.external.clone()
    }

    fn internal_cache_dir(&self) -> PathBuf {
        self.internal.clone()
    }
}
