//! Shared fixtures for integration tests: a deterministic embedder and a
//! mock of the remote generation API.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pero::config::GenerationConfig;
use pero::pero_core::embedding::EmbeddingProvider;
use pero::pero_core::guardrail::DEFAULT_KEYWORDS;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ─── Embedders ──────────────────────────────────────────────────────

/// One dimension per guardrail keyword, set to 1.0 when the lowercased
/// text contains that keyword. Off-topic text embeds to the zero vector,
/// which scores 0.0 against every keyword.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-indicator"
    }

    fn dims(&self) -> usize {
        self.keywords.len()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
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

/// Embedder whose model never loads.
pub struct UnavailableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnavailableEmbedder {
    fn model_name(&self) -> &str {
        "unavailable"
    }

    fn dims(&self) -> usize {
        384
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Failed to initialize local embedding model 'unavailable': no weights")
    }
}

// ─── Mock generation API ────────────────────────────────────────────

pub const MOJITO_REPLY: &str = r#"{
  "name": "Mojito Royal",
  "ingredients": ["5 cl de rhum blanc", "10 feuilles de menthe", "2 cl de jus de citron vert", "Champagne"],
  "instructions": "Piler la menthe avec le citron, ajouter le rhum et des glaçons, compléter au champagne.",
  "taste_profile": {"Sweetness": 3.5, "Acidity": 3.0, "Bitterness": 1.5, "Strength": 3.2, "Freshness": 4.8}
}"#;

pub struct MockGemini {
    reply_text: String,
    pub generations: AtomicUsize,
}

async fn model_lookup(Path(_model): Path<String>) -> StatusCode {
    StatusCode::OK
}

async fn generate(
    State(mock): State<Arc<MockGemini>>,
    Path(_target): Path<String>,
) -> impl IntoResponse {
    mock.generations.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": mock.reply_text }] } }]
    }))
}

/// Start a mock generation service answering every request with
/// `reply_text`. Returns the mock and a config pointing at it.
pub async fn start_mock_gemini(reply_text: &str) -> (Arc<MockGemini>, GenerationConfig) {
    let mock = Arc::new(MockGemini {
        reply_text: reply_text.to_string(),
        generations: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/models/{model}", get(model_lookup).post(generate))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = GenerationConfig {
        base_url: format!("http://{}", addr),
        models: vec!["gemini-test".to_string()],
        timeout_secs: Some(5),
        ..GenerationConfig::default()
    };
    (mock, config)
}
