use crate::error::{Result, ToolError};
use disk_lru_cache::CacheConfig;
use std::path::PathBuf;

/// Cache name used when `CACHE_DIR` is not set
pub const DEFAULT_CACHE_NAME: &str = "disk-lru-cache";

/// Tool configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Explicit cache directory; resolved from the platform cache location
    /// when absent
    pub cache_dir: Option<PathBuf>,
    pub cache: CacheConfig,
}

impl ToolConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = CacheConfig::default();

        let cache_dir = lookup("CACHE_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let max_bytes = parse_var(&lookup, "MAX_CACHE_SIZE", defaults.max_bytes)?;
        let max_items = parse_var(&lookup, "MAX_CACHE_ITEMS", defaults.max_items)?;
        let eviction_budget = parse_var(&lookup, "EVICTION_BUDGET", defaults.eviction_budget)?;

        if eviction_budget == 0 {
            return Err(ToolError::Config(
                "EVICTION_BUDGET must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            cache_dir,
            cache: CacheConfig {
                max_bytes,
                max_items,
                eviction_budget,
                ..defaults
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ToolError::Config(format!("invalid {}: {:?}", name, raw))),
        None => Ok(default),
    }
}
