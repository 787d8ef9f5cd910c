//! Recipe cache abstraction.
//!
//! The [`RecipeStore`] trait is the only thing the orchestrator knows about
//! persistence, so a backend with per-key atomicity can replace the JSON
//! file store without touching the pipeline.
//!
//! Keys are derived with [`cache_key`]: the request is lowercased and
//! trimmed ([`normalize_query`]) and then hashed with SHA-256, giving a
//! 64-character lowercase hex string.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::models::Recipe;

/// Lowercase and trim a request so that trivially different spellings
/// share a cache entry.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Stable cache key for a request.
///
/// ```rust
/// use pero_core::store::cache_key;
///
/// assert_eq!(cache_key("Mojito"), cache_key("  mojito  "));
/// assert_eq!(cache_key("mojito").len(), 64);
/// ```
pub fn cache_key(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_query(query).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Abstract storage backend for generated recipes.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](RecipeStore::get) | Look up the recipe cached for a request |
/// | [`put`](RecipeStore::put) | Insert or overwrite the recipe for a request |
///
/// Both take the raw request text; implementations derive the key with
/// [`cache_key`].
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Retrieve the recipe cached for `query`, if any.
    ///
    /// An unreadable backing store counts as empty rather than an error.
    async fn get(&self, query: &str) -> Result<Option<Recipe>>;

    /// Insert or overwrite the recipe cached for `query`.
    async fn put(&self, query: &str, recipe: &Recipe) -> Result<()>;
}
