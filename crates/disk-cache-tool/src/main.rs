//! disk-cache - inspect and maintain disk LRU cache directories
//!
//! Opens the cache described by the environment and runs a single command
//! against it.

mod command;
mod config;
mod error;

use crate::command::Command;
use crate::config::{ToolConfig, DEFAULT_CACHE_NAME};
use crate::error::Result;
use disk_lru_cache::{CacheFactory, LocalStorage, RawBytes};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("disk_cache_tool=info".parse()?)
        .add_directive("disk_lru_cache=info".parse()?);

    // Use JSON format for structured log collection when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = ToolConfig::from_env()?;
    info!(
        "Max cache size: {} KB, max items: {}",
        config.cache.max_bytes / 1024,
        config.cache.max_items
    );

    let factory = CacheFactory::new(Arc::new(LocalStorage::new()), RawBytes);
    let cache = match config.cache_dir {
        Some(dir) => factory.open(dir, config.cache).await?,
        None => factory.open_named(DEFAULT_CACHE_NAME, config.cache).await?,
    };
    info!("Cache dir: {:?}", cache.cache_dir());

    let stdout = std::io::stdout();
    command.run(&cache, &mut stdout.lock()).await?;

    Ok(())
}
