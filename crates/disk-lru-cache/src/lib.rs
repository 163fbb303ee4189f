//! Disk-backed LRU cache
//!
//! Stores opaque payloads as flat files in a single directory and keeps an
//! in-memory, access-ordered index of them. The cache is bounded both by the
//! number of entries and by their total size in bytes; the index is rebuilt
//! from the directory listing on startup, so the filesystem is the only
//! persisted state.

mod cache;
pub mod codec;
pub mod error;
mod factory;
mod index;
mod key;
mod policy;
pub mod storage;
mod types;

pub use cache::DiskLruCache;
pub use codec::{JsonCodec, PayloadCodec, RawBytes};
pub use error::{CacheError, CodecError, Result};
pub use factory::CacheFactory;
pub use index::CacheIndex;
pub use key::{KeyCodec, DEFAULT_FILE_PREFIX};
pub use policy::{should_evict, EvictionPolicy, DEFAULT_EVICTION_BUDGET};
pub use storage::{LocalStorage, StorageCapabilities};
pub use types::{CacheConfig, CacheEntry, CacheStats};
