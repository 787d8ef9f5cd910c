//! Wiring of the request pipeline from configuration.
//!
//! One call to [`build_orchestrator`] creates the process-wide embedding
//! provider, the guardrail, the JSON cache and the remote client, and
//! hands them to a [`RecipeOrchestrator`]. Nothing is loaded or contacted
//! here: the embedding model loads on the first relevance check and the
//! remote model is looked up on the first generation.

use anyhow::{bail, Result};
use std::sync::Arc;

use pero_core::guardrail::RelevanceGuardrail;
use pero_core::models::{enrich_query, Budget};
use pero_core::orchestrator::RecipeOrchestrator;

use crate::cache::JsonFileStore;
use crate::config::Config;
use crate::embedding::create_provider;
use crate::generation::GeminiClient;

pub fn build_orchestrator(config: &Config) -> Result<RecipeOrchestrator> {
    let provider = create_provider(&config.embedding)?;
    let guardrail = Arc::new(RelevanceGuardrail::new(provider, config.guardrail.settings()));
    let store = Arc::new(JsonFileStore::new(&config.cache.path));
    let generator = Arc::new(GeminiClient::from_config(&config.generation)?);

    Ok(RecipeOrchestrator::new(guardrail, store, generator))
}

/// Trim a user request and attach its budget, rejecting empty input.
///
/// The returned text is what the pipeline sees, so it is also what the
/// cache key is derived from.
pub fn prepare_query(query: &str, budget: Option<Budget>) -> Result<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        bail!("query must not be empty");
    }
    Ok(enrich_query(trimmed, budget))
}
