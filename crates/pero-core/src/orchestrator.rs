//! End-to-end request handling.
//!
//! [`RecipeOrchestrator::handle`] is the single entry point presentation
//! layers call. Steps run in a fixed order and none is retried:
//!
//! 1. Relevance check; a rejection returns immediately (no cache read,
//!    no generation, no cache write).
//! 2. Cache lookup; a hit is returned unmodified.
//! 3. Remote generation.
//! 4. Deterministic fallback if step 3 produced nothing.
//! 5. Cache write.
//!
//! Only an embedding failure escapes as an error. Cache read/write
//! failures and every generation failure are logged and absorbed.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fallback::generate_fallback;
use crate::generation::RecipeGenerator;
use crate::guardrail::RelevanceGuardrail;
use crate::models::{Outcome, Recipe, RelevanceResult};
use crate::store::RecipeStore;

/// Composes guardrail, cache, remote generator and fallback.
pub struct RecipeOrchestrator {
    guardrail: Arc<RelevanceGuardrail>,
    store: Arc<dyn RecipeStore>,
    generator: Arc<dyn RecipeGenerator>,
}

impl RecipeOrchestrator {
    pub fn new(
        guardrail: Arc<RelevanceGuardrail>,
        store: Arc<dyn RecipeStore>,
        generator: Arc<dyn RecipeGenerator>,
    ) -> Self {
        Self {
            guardrail,
            store,
            generator,
        }
    }

    pub fn guardrail(&self) -> &RelevanceGuardrail {
        &self.guardrail
    }

    pub fn store(&self) -> &dyn RecipeStore {
        self.store.as_ref()
    }

    /// Relevance check on its own, for callers that only need the verdict.
    pub async fn check_relevance(&self, text: &str) -> Result<RelevanceResult> {
        self.guardrail.check_relevance(text).await
    }

    /// Answer a request with a recipe or a refusal.
    ///
    /// `query` must be non-empty; callers validate input first.
    ///
    /// # Errors
    ///
    /// Only when the embedding model cannot be loaded or run.
    pub async fn handle(&self, query: &str) -> Result<Outcome> {
        let relevance = self.guardrail.check_relevance(query).await?;
        if !relevance.is_ok() {
            let message = relevance
                .reason
                .unwrap_or_else(|| self.guardrail.settings().refusal_message.clone());
            return Ok(Outcome::Rejected { message });
        }

        match self.store.get(query).await {
            Ok(Some(recipe)) => {
                debug!(name = %recipe.name, "cache hit");
                return Ok(Outcome::Ok {
                    recipe,
                    cache_hit: true,
                });
            }
            Ok(None) => debug!("cache miss"),
            Err(e) => warn!(error = %e, "recipe cache unreadable, treating as miss"),
        }

        let recipe = self.generate(query).await;

        if let Err(e) = self.store.put(query, &recipe).await {
            warn!(error = %e, "failed to write recipe cache");
        }

        Ok(Outcome::Ok {
            recipe,
            cache_hit: false,
        })
    }

    async fn generate(&self, query: &str) -> Recipe {
        match self.generator.generate(query).await {
            Ok(recipe) => recipe,
            Err(e) => {
                warn!(
                    generator = self.generator.name(),
                    reason = %e,
                    "generation failed, using fallback recipe"
                );
                generate_fallback(query)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingProvider;
    use crate::generation::{GenerationError, ReplyError};
    use crate::guardrail::{GuardrailSettings, REFUSAL_MESSAGE};
    use crate::models::TasteProfile;
    use crate::store::memory::InMemoryStore;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One dimension per guardrail keyword, set when the text contains it.
    struct KeywordEmbedder {
        keywords: Vec<String>,
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword-test"
        }
        fn dims(&self) -> usize {
            self.keywords.len()
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    self.keywords
                        .iter()
                        .map(|k| if t.contains(k.as_str()) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect())
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        fn model_name(&self) -> &str {
            "broken"
        }
        fn dims(&self) -> usize {
            0
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            bail!("model weights not found")
        }
    }

    /// Store whose backend is always unavailable.
    struct FailingStore {
        puts: AtomicUsize,
    }

    #[async_trait]
    impl RecipeStore for FailingStore {
        async fn get(&self, _query: &str) -> Result<Option<Recipe>> {
            bail!("cache file unreadable")
        }
        async fn put(&self, _query: &str, _recipe: &Recipe) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            bail!("disk full")
        }
    }

    enum Behavior {
        Succeed,
        Fail,
    }

    struct StubGenerator {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubGenerator {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RecipeGenerator for StubGenerator {
        fn name(&self) -> &str {
            "stub"
        }
        async fn generate(&self, query: &str) -> Result<Recipe, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed => Ok(Recipe {
                    name: "Mojito Maison".into(),
                    ingredients: vec!["5 cl de rhum".into(), "Menthe".into()],
                    instructions: "Piler, verser, servir.".into(),
                    taste_profile: TasteProfile::new(3.5, 3.0, 1.5, 3.0, 4.5),
                    source_query: query.to_string(),
                }),
                Behavior::Fail => Err(ReplyError::MissingField("instructions").into()),
            }
        }
    }

    fn guardrail(provider: Arc<dyn EmbeddingProvider>) -> Arc<RelevanceGuardrail> {
        Arc::new(RelevanceGuardrail::new(provider, GuardrailSettings::default()))
    }

    fn keyword_guardrail() -> Arc<RelevanceGuardrail> {
        let settings = GuardrailSettings::default();
        let provider = Arc::new(KeywordEmbedder {
            keywords: settings.keywords.clone(),
        });
        guardrail(provider)
    }

    #[tokio::test]
    async fn test_rejection_skips_cache_and_generation() {
        let store = Arc::new(InMemoryStore::new());
        let generator = Arc::new(StubGenerator::new(Behavior::Succeed));
        let orch = RecipeOrchestrator::new(keyword_guardrail(), store.clone(), generator.clone());

        let outcome = orch.handle("Comment réparer mon vélo ?").await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Rejected {
                message: REFUSAL_MESSAGE.to_string()
            }
        );
        assert!(store.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_request_is_cache_hit() {
        let store = Arc::new(InMemoryStore::new());
        let generator = Arc::new(StubGenerator::new(Behavior::Succeed));
        let orch = RecipeOrchestrator::new(keyword_guardrail(), store.clone(), generator.clone());

        let first = orch.handle("Je veux un Mojito").await.unwrap();
        let second = orch.handle("Je veux un Mojito").await.unwrap();

        let (Outcome::Ok { recipe: r1, cache_hit: h1 }, Outcome::Ok { recipe: r2, cache_hit: h2 }) =
            (first, second)
        else {
            panic!("expected two ok outcomes");
        };
        assert!(!h1);
        assert!(h2);
        assert_eq!(r1, r2);
        assert_eq!(r1.source_query, "Je veux un Mojito");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_and_caches() {
        let store = Arc::new(InMemoryStore::new());
        let generator = Arc::new(StubGenerator::new(Behavior::Fail));
        let orch = RecipeOrchestrator::new(keyword_guardrail(), store.clone(), generator);

        let query = "Un cocktail frais au gin";
        let outcome = orch.handle(query).await.unwrap();
        let expected = generate_fallback(query);
        assert_eq!(
            outcome,
            Outcome::Ok {
                recipe: expected.clone(),
                cache_hit: false
            }
        );
        assert_eq!(store.get(query).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_fatal() {
        let store = Arc::new(InMemoryStore::new());
        let generator = Arc::new(StubGenerator::new(Behavior::Succeed));
        let orch = RecipeOrchestrator::new(guardrail(Arc::new(BrokenEmbedder)), store.clone(), generator);

        let err = orch.handle("Je veux un Mojito").await.unwrap_err();
        assert!(err.to_string().contains("model weights not found"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_failures_are_absorbed() {
        let store = Arc::new(FailingStore {
            puts: AtomicUsize::new(0),
        });
        let generator = Arc::new(StubGenerator::new(Behavior::Succeed));
        let orch = RecipeOrchestrator::new(keyword_guardrail(), store.clone(), generator.clone());

        for _ in 0..2 {
            let outcome = orch.handle("Je veux un Mojito").await.unwrap();
            let Outcome::Ok { recipe, cache_hit } = outcome else {
                panic!("expected ok outcome");
            };
            assert!(!cache_hit);
            assert_eq!(recipe.name, "Mojito Maison");
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.puts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_failures_with_fallback() {
        let store = Arc::new(FailingStore {
            puts: AtomicUsize::new(0),
        });
        let generator = Arc::new(StubGenerator::new(Behavior::Fail));
        let orch = RecipeOrchestrator::new(keyword_guardrail(), store, generator);

        let query = "Un whisky bien fort";
        assert_eq!(
            orch.handle(query).await.unwrap(),
            Outcome::Ok {
                recipe: generate_fallback(query),
                cache_hit: false
            }
        );
    }
}
