//! Cache types

use crate::key::DEFAULT_FILE_PREFIX;
use crate::policy::DEFAULT_EVICTION_BUDGET;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for a cached file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub encoded_key: String,
    pub path: PathBuf,
    /// File length at last write, used for running totals
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Bytes of non-cache files found in the directory when it was opened
    pub foreign_bytes: u64,
}

/// Limits and naming for a cache directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_bytes: u64,
    pub max_items: usize,
    /// Maximum number of entries evicted by a single flush
    pub eviction_budget: usize,
    pub file_prefix: String,
}

impl CacheConfig {
    pub fn new(max_bytes: u64, max_items: usize) -> Self {
        Self {
            max_bytes,
            max_items,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024, // 5MB
            max_items: 64,
            eviction_budget: DEFAULT_EVICTION_BUDGET,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.max_items, 64);
        assert_eq!(config.eviction_budget, 4);
        assert_eq!(config.file_prefix, "cache_");
    }

    #[test]
    fn test_config_new_keeps_defaults() {
        let config = CacheConfig::new(10, 2);
        assert_eq!(config.max_bytes, 10);
        assert_eq!(config.max_items, 2);
        assert_eq!(config.eviction_budget, DEFAULT_EVICTION_BUDGET);
        assert_eq!(config.file_prefix, DEFAULT_FILE_PREFIX);
    }

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.foreign_bytes, 0);
    }

    #[test]
    fn test_cache_stats_serialization() {
        let stats = CacheStats {
            entries: 3,
            total_size: 12345,
            hits: 7,
            misses: 2,
            evictions: 1,
            foreign_bytes: 99,
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"total_size\":12345"));
        assert!(json.contains("\"foreign_bytes\":99"));
    }

    #[test]
    fn test_cache_entry_serialization() {
        let entry = CacheEntry {
            key: "a b".to_string(),
            encoded_key: "a%20b".to_string(),
            path: PathBuf::from("/cache/cache_a%20b"),
            size: 12345,
            modified: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, entry);
    }
}
