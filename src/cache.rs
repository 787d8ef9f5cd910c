//! JSON-file recipe cache.
//!
//! Persists recipes in a single pretty-printed UTF-8 JSON object mapping
//! cache keys (see [`pero_core::store::cache_key`]) to recipe objects:
//!
//! ```json
//! {
//!   "09d8516d…": {
//!     "name": "Mojito Royal",
//!     "ingredients": ["5 cl de rhum blanc", "…"],
//!     "instructions": "…",
//!     "taste_profile": { "Sweetness": 3.5, "Acidity": 3.0, "Bitterness": 1.5, "Strength": 3.2, "Freshness": 4.8 },
//!     "source_query": "Je veux un Mojito"
//!   }
//! }
//! ```
//!
//! Every operation reloads the whole file and every write rewrites it.
//! Reads never fail: a missing, unreadable or corrupt file counts as empty
//! and individual malformed entries are skipped, both with a warning.
//! Writes carry malformed entries through untouched, so only a file that
//! is not a JSON object at all gets replaced by the next write.
//!
//! # Concurrency
//!
//! Within one process, writes are serialized by a mutex and land through
//! a temporary file plus `rename`, so readers never see a torn file and
//! two concurrent `put`s cannot drop each other's entry. Separate
//! processes sharing the file can still lose an update when their
//! read-modify-write cycles interleave.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

use pero_core::models::Recipe;
use pero_core::store::{cache_key, RecipeStore};

/// Recipe store backed by one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole mapping, tolerating a missing or damaged file.
    pub async fn load(&self) -> BTreeMap<String, Recipe> {
        self.load_raw()
            .await
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<Recipe>(value) {
                Ok(recipe) => Some((key, recipe)),
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping malformed recipe cache entry");
                    None
                }
            })
            .collect()
    }

    /// Entries as stored, without checking their shape.
    async fn load_raw(&self) -> BTreeMap<String, serde_json::Value> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "recipe cache unreadable, treating as empty");
                return BTreeMap::new();
            }
        };

        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "recipe cache corrupt, treating as empty");
                BTreeMap::new()
            }
        }
    }

    /// All cached entries, ordered by key.
    pub async fn entries(&self) -> Vec<(String, Recipe)> {
        self.load().await.into_iter().collect()
    }

    async fn save(&self, entries: &BTreeMap<String, serde_json::Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recipe_cache.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()))
    }
}

#[async_trait]
impl RecipeStore for JsonFileStore {
    async fn get(&self, query: &str) -> Result<Option<Recipe>> {
        let mut entries = self.load().await;
        Ok(entries.remove(&cache_key(query)))
    }

    async fn put(&self, query: &str, recipe: &Recipe) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_raw().await;
        entries.insert(cache_key(query), serde_json::to_value(recipe)?);
        self.save(&entries).await
    }
}
