//! store.rs — persisted-key adapter behind the dedup history and the cached
//! device token. The trait exists so tests can swap in an in-memory fake.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// `None` when the key is missing or unreadable; callers fail open.
    async fn read(&self, key: &str) -> Option<String>;
    async fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Flat-file store: one JSON file per key under a state directory.
pub struct FsStateStore {
    dir: PathBuf,
}

impl FsStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl StateStore for FsStateStore {
    async fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).await.ok()
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create state dir {}", self.dir.display()))?;
        fs::write(self.path_for(key), value)
            .await
            .with_context(|| format!("write state key {key}"))?;
        Ok(())
    }
}
