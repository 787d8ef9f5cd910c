//! `pero cache` commands: inspect the recipe cache without touching the
//! embedding model or the remote service.

use anyhow::Result;
use serde::Serialize;

use pero_core::models::Recipe;
use pero_core::store::RecipeStore;

use crate::ask::render_recipe;
use crate::cache::JsonFileStore;
use crate::config::Config;

#[derive(Debug, Serialize)]
pub struct CacheEntry {
    pub key: String,
    #[serde(flatten)]
    pub recipe: Recipe,
}

pub async fn list_entries(config: &Config) -> Vec<CacheEntry> {
    JsonFileStore::new(&config.cache.path)
        .entries()
        .await
        .into_iter()
        .map(|(key, recipe)| CacheEntry { key, recipe })
        .collect()
}

pub async fn run_cache_list(config: &Config, json: bool) -> Result<()> {
    let entries = list_entries(config).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Cache is empty ({}).", config.cache.path.display());
        return Ok(());
    }

    for entry in &entries {
        let query = if entry.recipe.source_query.is_empty() {
            "?"
        } else {
            entry.recipe.source_query.as_str()
        };
        println!("{}  {}  [{}]", short_key(&entry.key), entry.recipe.name, query);
    }
    println!("\n{} cached recipe(s).", entries.len());
    Ok(())
}

/// First 12 characters of a key. Hand-edited files may hold any key.
fn short_key(key: &str) -> String {
    key.chars().take(12).collect()
}

pub async fn run_cache_show(config: &Config, query: &str, json: bool) -> Result<()> {
    let store = JsonFileStore::new(&config.cache.path);
    let Some(recipe) = store.get(query).await? else {
        anyhow::bail!("no cached recipe for: {}", query.trim());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        print!("{}", render_recipe(&recipe));
    }
    Ok(())
}
