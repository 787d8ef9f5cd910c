//! Semantic relevance guardrail.
//!
//! Filters off-topic requests before any cache lookup or generation work.
//! The request text is embedded and compared against a fixed set of domain
//! keywords; the single best cosine similarity decides the verdict.
//!
//! Taking the maximum rather than an average keeps compound requests
//! ("un cocktail sucré et un snack") on-topic as long as one part of the
//! sentence strongly matches a keyword.

use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::embedding::{embed_query, max_similarity, EmbeddingProvider};
use crate::models::{RelevanceResult, Verdict};

/// Minimum similarity a request needs to be considered on-topic.
pub const RELEVANCE_THRESHOLD: f32 = 0.35;

/// Message returned to the caller when a request is rejected.
pub const REFUSAL_MESSAGE: &str =
    "🚫 Désolé, le barman ne comprend que les commandes de boissons !";

/// Domain keywords: drink categories, spirits and canonical cocktails.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "cocktail",
    "alcool",
    "boisson",
    "mojito",
    "whisky",
    "rhum",
    "vodka",
    "gin",
    "bière",
    "vin",
    "apéritif",
    "digestif",
    "bar",
    "barman",
    "shaker",
    "tequila",
    "champagne",
    "liqueur",
    "margarita",
    "spritz",
];

/// Tunables for a [`RelevanceGuardrail`].
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailSettings {
    pub threshold: f32,
    pub keywords: Vec<String>,
    pub refusal_message: String,
}

impl Default for GuardrailSettings {
    fn default() -> Self {
        Self {
            threshold: RELEVANCE_THRESHOLD,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            refusal_message: REFUSAL_MESSAGE.to_string(),
        }
    }
}

/// Decide relevance from pre-computed vectors.
///
/// `keyword_vecs[i]` must be the embedding of `settings.keywords[i]`.
/// With no keywords at all the score is `0.0`.
pub fn evaluate(
    text_vec: &[f32],
    keyword_vecs: &[Vec<f32>],
    settings: &GuardrailSettings,
) -> RelevanceResult {
    let (score, matched_keyword) = match max_similarity(text_vec, keyword_vecs) {
        Some((idx, score)) => (score, settings.keywords.get(idx).cloned()),
        None => (0.0, None),
    };

    if score >= settings.threshold {
        RelevanceResult {
            verdict: Verdict::Ok,
            score,
            reason: None,
            matched_keyword,
        }
    } else {
        RelevanceResult {
            verdict: Verdict::Rejected,
            score,
            reason: Some(settings.refusal_message.clone()),
            matched_keyword,
        }
    }
}

/// Embedding-backed relevance filter.
///
/// The keyword set is fixed for the lifetime of the guardrail, so its
/// vectors are computed on first use and reused afterwards.
pub struct RelevanceGuardrail {
    provider: Arc<dyn EmbeddingProvider>,
    settings: GuardrailSettings,
    keyword_vecs: OnceCell<Vec<Vec<f32>>>,
}

impl RelevanceGuardrail {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, settings: GuardrailSettings) -> Self {
        Self {
            provider,
            settings,
            keyword_vecs: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &GuardrailSettings {
        &self.settings
    }

    /// Check whether `text` belongs to the drinks domain.
    ///
    /// # Errors
    ///
    /// Only when the embedding provider fails, which the pipeline treats
    /// as fatal. An off-topic request is an `Ok` result with
    /// [`Verdict::Rejected`].
    pub async fn check_relevance(&self, text: &str) -> Result<RelevanceResult> {
        let keyword_vecs = self.keyword_vectors().await?;
        let text_vec = embed_query(self.provider.as_ref(), text).await?;

        let result = evaluate(&text_vec, keyword_vecs, &self.settings);
        match result.verdict {
            Verdict::Ok => debug!(
                score = result.score,
                keyword = result.matched_keyword.as_deref().unwrap_or(""),
                "request accepted"
            ),
            Verdict::Rejected => info!(score = result.score, "request rejected as off-topic"),
        }
        Ok(result)
    }

    async fn keyword_vectors(&self) -> Result<&Vec<Vec<f32>>> {
        self.keyword_vecs
            .get_or_try_init(|| async {
                let vecs = self.provider.embed(&self.settings.keywords).await?;
                if vecs.len() != self.settings.keywords.len() {
                    bail!(
                        "embedding provider returned {} vectors for {} keywords",
                        vecs.len(),
                        self.settings.keywords.len()
                    );
                }
                Ok(vecs)
            })
            .await
    }
}
