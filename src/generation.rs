//! Remote recipe generation via the Gemini `generateContent` REST API.
//!
//! [`GeminiClient`] implements [`RecipeGenerator`]. Every failure comes
//! back as a typed [`GenerationError`], and the orchestrator turns any of
//! them into a fallback recipe.
//!
//! # Model selection
//!
//! `generation.models` lists candidate model identifiers in order of
//! preference. On the first generation, the client checks each one with
//! `GET {base_url}/models/{id}` and keeps the first that answers 2xx for
//! the rest of its lifetime. If none does, that call uses the first
//! candidate and the next generation checks again.
//!
//! # Credential
//!
//! The API key is sent in the `x-goog-api-key` header. Without a key,
//! [`generate`](RecipeGenerator::generate) fails with
//! [`GenerationError::MissingCredential`] before any network traffic.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use pero_core::generation::{build_prompt, parse_reply, GenerationError, RecipeGenerator};
use pero_core::models::Recipe;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    api_key: Option<String>,
    base_url: String,
    models: Vec<String>,
    client: reqwest::Client,
    selected_model: OnceCell<String>,
}

impl GeminiClient {
    /// Build a client with an explicit credential (`None` = fallback only).
    pub fn new(config: &GenerationConfig, api_key: Option<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            client: builder.build()?,
            selected_model: OnceCell::new(),
        })
    }

    /// Build a client reading the credential from `config.api_key_env`.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            warn!(
                env = %config.api_key_env,
                "no generation API key set, every recipe will come from the fallback generator"
            );
        }
        Self::new(config, api_key)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// The model found available, once a generation has run.
    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model.get().map(String::as_str)
    }

    /// The memoized model, or the first candidate for this call only when
    /// no candidate answered.
    async fn model(&self, api_key: &str) -> String {
        let found = self
            .selected_model
            .get_or_try_init(|| async { self.find_available_model(api_key).await.ok_or(()) })
            .await;

        match found {
            Ok(model) => model.clone(),
            Err(()) => {
                // validated non-empty at config load
                let first = self.models.first().cloned().unwrap_or_default();
                warn!(model = %first, "no candidate model answered, trying the first one");
                first
            }
        }
    }

    async fn find_available_model(&self, api_key: &str) -> Option<String> {
        for model in &self.models {
            let resp = self
                .client
                .get(format!("{}/models/{}", self.base_url, model))
                .header(API_KEY_HEADER, api_key)
                .send()
                .await;

            match resp {
                Ok(r) if r.status().is_success() => {
                    info!(model = %model, "selected generation model");
                    return Some(model.clone());
                }
                Ok(r) => debug!(model = %model, status = %r.status(), "model lookup rejected"),
                Err(e) => debug!(model = %model, error = %e, "model lookup failed"),
            }
        }
        None
    }
}

#[async_trait]
impl RecipeGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, query: &str) -> Result<Recipe, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;
        let model = self.model(api_key).await;

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(query) }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("malformed response body: {}", e)))?;

        let text = reply_text(&json).ok_or(GenerationError::EmptyReply)?;
        let recipe = parse_reply(&text, query)?;
        debug!(model = %model, name = %recipe.name, "generated recipe");
        Ok(recipe)
    }
}

/// Concatenated text parts of the first candidate, if any.
fn reply_text(json: &serde_json::Value) -> Option<String> {
    let parts = json
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
