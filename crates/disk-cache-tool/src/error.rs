//! Error types for the disk cache tool

use std::fmt;

#[derive(Debug)]
pub enum ToolError {
    Cache(disk_lru_cache::CacheError),
    Io(Box<std::io::Error>),
    Config(String),
    Usage(String),
    NotCached(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Cache(err) => write!(f, "Cache error: {}", err),
            ToolError::Io(err) => write!(f, "IO error: {}", err),
            ToolError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ToolError::Usage(msg) => write!(f, "Usage error: {}", msg),
            ToolError::NotCached(key) => write!(f, "Not cached: {}", key),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Cache(err) => Some(err),
            ToolError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<disk_lru_cache::CacheError> for ToolError {
    fn from(err: disk_lru_cache::CacheError) -> Self {
        ToolError::Cache(err)
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Io(Box::new(err.into()))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ToolError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ToolError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cache_error_display() {
        let err = ToolError::Cache(disk_lru_cache::CacheError::NotWritable {
            path: PathBuf::from("/ro"),
            reason: "read-only".to_string(),
        });
        assert_eq!(
            format!("{}", err),
            "Cache error: Cache directory /ro is not writable: read-only"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ToolError::Config("invalid MAX_CACHE_SIZE".to_string());
        assert_eq!(format!("{}", err), "Configuration error: invalid MAX_CACHE_SIZE");
    }

    #[test]
    fn test_usage_error_display() {
        let err = ToolError::Usage("missing key".to_string());
        assert_eq!(format!("{}", err), "Usage error: missing key");
    }

    #[test]
    fn test_not_cached_display() {
        let err = ToolError::NotCached("img".to_string());
        assert_eq!(format!("{}", err), "Not cached: img");
    }

    #[test]
    fn test_error_is_debug() {
        let err = ToolError::Usage("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Usage"));
    }
}
