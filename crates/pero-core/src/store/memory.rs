//! In-memory [`RecipeStore`] implementation for tests and embedding hosts.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Each `put` is atomic per
//! key, so unlike the JSON file store it has no lost-update window.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::Recipe;

use super::{cache_key, RecipeStore};

/// In-memory recipe store.
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Recipe>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached recipes.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry exists under the key derived from `query`.
    pub fn contains(&self, query: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(&cache_key(query)))
            .unwrap_or(false)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    async fn get(&self, query: &str) -> Result<Option<Recipe>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("recipe store lock poisoned"))?;
        Ok(entries.get(&cache_key(query)).cloned())
    }

    async fn put(&self, query: &str, recipe: &Recipe) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("recipe store lock poisoned"))?;
        entries.insert(cache_key(query), recipe.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TasteProfile;

    fn recipe(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            ingredients: vec!["5 cl de gin".into(), "Tonic".into()],
            instructions: "Verser sur glace.".into(),
            taste_profile: TasteProfile::new(2.0, 2.5, 3.5, 3.0, 4.5),
            source_query: "gin tonic".into(),
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryStore::new();
        let r = recipe("Gin Tonic");
        store.put("Gin Tonic", &r).await.unwrap();
        assert_eq!(store.get("  gin tonic ").await.unwrap(), Some(r));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_is_none() {
        let store = InMemoryStore::new();
        assert!(store.get("negroni").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemoryStore::new();
        store.put("gin tonic", &recipe("First")).await.unwrap();
        store.put("GIN TONIC", &recipe("Second")).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("gin tonic").await.unwrap().unwrap().name, "Second");
    }
}
