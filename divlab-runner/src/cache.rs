//! Result caching keyed by (input hash, config hash).
//!
//! The cache is injected into the batch runner rather than held in a global,
//! so the per-game pipeline stays a pure function.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use divlab_core::domain::CacheKey;

use crate::runner::GameResult;

/// Key/value store for completed game results.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<GameResult>>;
    fn put(&self, key: &CacheKey, result: &GameResult) -> Result<()>;
}

/// In-process cache, mostly for tests and repeated batches in one process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, GameResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<GameResult>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &CacheKey, result: &GameResult) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        entries.insert(key.clone(), result.clone());
        Ok(())
    }
}

/// One pretty JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    cache_dir: PathBuf,
}

impl JsonFileCache {
    /// Creates a new cache with the specified directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir).with_context(|| {
            format!("Failed to create cache directory {}", cache_dir.display())
        })?;
        Ok(Self { cache_dir })
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.result_path(key).exists()
    }

    /// Removes a result from the cache.
    pub fn remove(&self, key: &CacheKey) -> Result<()> {
        let path = self.result_path(key);
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove cached result")?;
        }
        Ok(())
    }

    /// Clears all cached results.
    pub fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if is_json_file(&path) {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Returns the number of cached results.
    pub fn len(&self) -> Result<usize> {
        let count = std::fs::read_dir(&self.cache_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| is_json_file(&entry.path()))
            .count();
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn result_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{key}.json"))
    }
}

fn is_json_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
}

impl ResultCache for JsonFileCache {
    fn get(&self, key: &CacheKey) -> Result<Option<GameResult>> {
        let path = self.result_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cached result {}", path.display()))?;
        let result: GameResult =
            serde_json::from_str(&json).context("Failed to deserialize cached result")?;
        Ok(Some(result))
    }

    fn put(&self, key: &CacheKey, result: &GameResult) -> Result<()> {
        let path = self.result_path(key);
        let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
        // Readers never see a partial file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).context("Failed to write cached result")?;
        std::fs::rename(&tmp, &path).context("Failed to move cached result into place")?;
        Ok(())
    }
}
