//! Tool commands

use crate::error::{Result, ToolError};
use disk_lru_cache::DiskLruCache;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

pub const USAGE: &str = "usage: disk-cache <stats|list|get KEY|put KEY FILE|remove KEY|clear>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats,
    List,
    Get { key: String },
    Put { key: String, file: PathBuf },
    Remove { key: String },
    Clear,
}

impl Command {
    /// Parse a command from the arguments following the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let usage = || ToolError::Usage(USAGE.to_string());
        let arg = |i: usize| args.get(i).cloned().ok_or_else(usage);

        let command = match args.first().map(String::as_str) {
            Some("stats") => Command::Stats,
            Some("list") => Command::List,
            Some("get") => Command::Get { key: arg(1)? },
            Some("put") => Command::Put {
                key: arg(1)?,
                file: PathBuf::from(arg(2)?),
            },
            Some("remove") => Command::Remove { key: arg(1)? },
            Some("clear") => Command::Clear,
            _ => return Err(usage()),
        };
        Ok(command)
    }

    /// Run against an open cache, writing results to `out`
    pub async fn run(&self, cache: &DiskLruCache, out: &mut impl Write) -> Result<()> {
        match self {
            Command::Stats => {
                let stats = cache.stats().await;
                writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
            }
            Command::List => {
                for key in cache.keys_oldest_first().await {
                    writeln!(out, "{}", key)?;
                }
            }
            Command::Get { key } => match cache.get(key).await {
                Some(bytes) => out.write_all(&bytes)?,
                None => return Err(ToolError::NotCached(key.clone())),
            },
            Command::Put { key, file } => {
                let bytes = tokio::fs::read(file).await?;
                cache.put(key, &bytes).await;
                info!(key = %key, size = bytes.len(), "Stored payload");
            }
            Command::Remove { key } => {
                let removed = cache.remove(key).await;
                writeln!(out, "{}", if removed { "removed" } else { "not cached" })?;
            }
            Command::Clear => {
                let removed = cache.clear_cache().await;
                writeln!(out, "removed {} files", removed)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disk_lru_cache::{CacheConfig, LocalStorage, RawBytes};
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&args(&["stats"])).unwrap(), Command::Stats);
        assert_eq!(
            Command::parse(&args(&["put", "k", "/tmp/payload"])).unwrap(),
            Command::Put {
                key: "k".to_string(),
                file: PathBuf::from("/tmp/payload"),
            }
        );
        assert_eq!(
            Command::parse(&args(&["remove", "k"])).unwrap(),
            Command::Remove {
                key: "k".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse(&args(&[])).is_err());
        assert!(Command::parse(&args(&["get"])).is_err());
        assert!(Command::parse(&args(&["put", "k"])).is_err());
        assert!(Command::parse(&args(&["compact"])).is_err());
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::with_dirs(None, dir.path().to_path_buf());
        let cache =
            DiskLruCache::open(dir.path().join("c"), CacheConfig::default(), RawBytes, &storage)
                .await
                .unwrap();

        let payload = dir.path().join("payload.bin");
        std::fs::write(&payload, b"pixels").unwrap();

        let mut out = Vec::new();
        Command::parse(&args(&["put", "img", payload.to_str().unwrap()]))
            .unwrap()
            .run(&cache, &mut out)
            .await
            .unwrap();

        Command::Get {
            key: "img".to_string(),
        }
        .run(&cache, &mut out)
        .await
        .unwrap();
        assert_eq!(out, b"pixels");

        let mut out = Vec::new();
        Command::List.run(&cache, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "img\n");

        let mut out = Vec::new();
        Command::Remove {
            key: "img".to_string(),
        }
        .run(&cache, &mut out)
        .await
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "removed\n");

        let missing = Command::Get {
            key: "img".to_string(),
        }
        .run(&cache, &mut Vec::new())
        .await;
        assert!(matches!(missing, Err(ToolError::NotCached(key)) if key == "img"));
    }

    #[tokio::test]
    async fn test_stats_is_json() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::with_dirs(None, dir.path().to_path_buf());
        let cache = DiskLruCache::open(dir.path(), CacheConfig::default(), RawBytes, &storage)
            .await
            .unwrap();
        cache.put("a", &b"12345".to_vec()).await;

        let mut out = Vec::new();
        Command::Stats.run(&cache, &mut out).await.unwrap();

        let stats: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(stats["entries"], 1);
        assert_eq!(stats["total_size"], 5);
    }
}
