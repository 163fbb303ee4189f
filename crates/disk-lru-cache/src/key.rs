//! Cache key to file name mapping

use std::path::{Path, PathBuf};

/// Prefix every cache file name starts with
pub const DEFAULT_FILE_PREFIX: &str = "cache_";

/// Maps caller keys to filesystem-safe names inside the cache directory.
///
/// Keys are percent-encoded (everything except RFC 3986 unreserved
/// characters), so distinct keys map to distinct file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    prefix: String,
}

impl KeyCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Encode a key into its filesystem-safe form
    pub fn encode(&self, key: &str) -> String {
        urlencoding::encode(key).into_owned()
    }

    /// Best-effort reverse of [`encode`](Self::encode), used for entries
    /// discovered on disk. Falls back to the encoded form.
    pub fn decode(&self, encoded: &str) -> String {
        urlencoding::decode(encoded)
            .map(|key| key.into_owned())
            .unwrap_or_else(|_| encoded.to_string())
    }

    /// Recover the encoded key from a directory listing name
    pub fn strip_prefix<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name.strip_prefix(self.prefix.as_str())
    }

    pub fn file_name(&self, encoded: &str) -> String {
        format!("{}{}", self.prefix, encoded)
    }

    pub fn file_path(&self, cache_dir: &Path, encoded: &str) -> PathBuf {
        cache_dir.join(self.file_name(encoded))
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_PREFIX)
    }
}
