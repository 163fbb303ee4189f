//! Error types for the disk LRU cache

use std::fmt;
use std::path::PathBuf;

/// Errors surfaced when opening a cache.
///
/// Once a cache is open, per-entry I/O failures are logged and absorbed by
/// the cache itself; none of these variants escape `get`/`put`/`remove`.
#[derive(Debug)]
pub enum CacheError {
    NotWritable { path: PathBuf, reason: String },
    InsufficientSpace {
        path: PathBuf,
        available: u64,
        required: u64,
    },
    InvalidConfig(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotWritable { path, reason } => {
                write!(f, "Cache directory {} is not writable: {}", path.display(), reason)
            }
            CacheError::InsufficientSpace {
                path,
                available,
                required,
            } => write!(
                f,
                "Insufficient space for cache at {}: {} bytes available, more than {} required",
                path.display(),
                available,
                required
            ),
            CacheError::InvalidConfig(msg) => write!(f, "Invalid cache configuration: {}", msg),
            CacheError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors produced by a [`PayloadCodec`](crate::PayloadCodec)
#[derive(Debug)]
pub enum CodecError {
    /// The bytes do not describe a valid payload
    Malformed(String),
    /// Materializing the payload needed more memory than is available
    ResourceExhausted(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Malformed(msg) => write!(f, "Malformed payload: {}", msg),
            CodecError::ResourceExhausted(msg) => write!(f, "Resource exhausted: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Malformed(err.to_string())
    }
}
