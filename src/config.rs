//! TOML configuration.
//!
//! Every section has defaults, so a missing config file is a valid
//! configuration. The generation credential is never read from the file:
//! it comes from the environment variable named by
//! `generation.api_key_env`, and its absence puts the service in
//! fallback-only mode.
//!
//! ```toml
//! [embedding]
//! provider = "local"
//! model = "all-minilm-l6-v2"
//!
//! [guardrail]
//! threshold = 0.35
//!
//! [cache]
//! path = "data/recipe_cache.json"
//!
//! [generation]
//! api_key_env = "GEMINI_API_KEY"
//! models = ["gemini-2.0-flash", "gemini-1.5-flash"]
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```

use anyhow::{Context, Result};
use pero_core::guardrail::{GuardrailSettings, DEFAULT_KEYWORDS, REFUSAL_MESSAGE, RELEVANCE_THRESHOLD};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub guardrail: GuardrailConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the `ollama` provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Retries for transient `ollama` failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_embedding_model(),
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_embedding_model() -> String {
    "all-minilm-l6-v2".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GuardrailConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_refusal_message")]
    pub refusal_message: String,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            keywords: default_keywords(),
            refusal_message: default_refusal_message(),
        }
    }
}

impl GuardrailConfig {
    pub fn settings(&self) -> GuardrailSettings {
        GuardrailSettings {
            threshold: self.threshold,
            keywords: self.keywords.clone(),
            refusal_message: self.refusal_message.clone(),
        }
    }
}

fn default_threshold() -> f32 {
    RELEVANCE_THRESHOLD
}
fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}
fn default_refusal_message() -> String {
    REFUSAL_MESSAGE.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/recipe_cache.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Candidate model identifiers, in order of preference.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Request timeout. Unset leaves the HTTP client's default in place.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            models: default_models(),
            timeout_secs: None,
        }
    }
}

impl GenerationConfig {
    /// Read the credential from the environment. Empty counts as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_models() -> Vec<String> {
    vec![
        "gemini-2.0-flash".to_string(),
        "gemini-1.5-flash".to_string(),
        "gemini-1.5-pro".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Load and validate the configuration at `path`.
///
/// A missing file yields [`Config::default`]; a file that exists but
/// cannot be parsed or fails validation is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };

    validate(&config)?;
    Ok(config)
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

/// Check cross-field constraints.
pub fn validate(config: &Config) -> Result<()> {
    if !(0.0..=1.0).contains(&config.guardrail.threshold) {
        anyhow::bail!("guardrail.threshold must be in [0.0, 1.0]");
    }

    if config.guardrail.keywords.iter().all(|k| k.trim().is_empty()) {
        anyhow::bail!("guardrail.keywords must contain at least one keyword");
    }

    if config.generation.models.is_empty() {
        anyhow::bail!("generation.models must list at least one model");
    }

    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    match config.embedding.provider.as_str() {
        "local" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be local or ollama.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.guardrail.threshold, 0.35);
        assert_eq!(cfg.guardrail.keywords.len(), DEFAULT_KEYWORDS.len());
        assert_eq!(cfg.cache.path, PathBuf::from("data/recipe_cache.json"));
        assert_eq!(cfg.generation.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.generation.models[0], "gemini-2.0-flash");
        assert!(cfg.generation.timeout_secs.is_none());
        assert_eq!(cfg.embedding.provider, "local");
    }

    #[test]
    fn test_missing_file_is_default() {
        let cfg = load_config(Path::new("/nonexistent/pero.toml")).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:7341");
    }

    #[test]
    fn test_partial_sections() {
        let cfg = parse_config(
            r#"
[guardrail]
threshold = 0.5

[generation]
models = ["gemini-test"]
timeout_secs = 5
"#,
        )
        .unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.guardrail.threshold, 0.5);
        assert_eq!(cfg.guardrail.refusal_message, REFUSAL_MESSAGE);
        assert_eq!(cfg.generation.models, vec!["gemini-test".to_string()]);
        assert_eq!(cfg.generation.timeout_secs, Some(5));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let cfg = parse_config("[guardrail]\nthreshold = 1.5\n").unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_rejects_empty_models_and_keywords() {
        let cfg = parse_config("[generation]\nmodels = []\n").unwrap();
        assert!(validate(&cfg).is_err());

        let cfg = parse_config("[guardrail]\nkeywords = []\n").unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let cfg = parse_config("[embedding]\nprovider = \"openai\"\n").unwrap();
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let cfg = parse_config(include_str!("../config/pero.example.toml")).unwrap();
        validate(&cfg).unwrap();
        let defaults = Config::default();
        assert_eq!(cfg.embedding.model, defaults.embedding.model);
        assert_eq!(cfg.guardrail.settings(), defaults.guardrail.settings());
        assert_eq!(cfg.cache.path, defaults.cache.path);
        assert_eq!(cfg.generation.models, defaults.generation.models);
        assert_eq!(cfg.server.bind, defaults.server.bind);
    }

    #[test]
    fn test_settings_conversion() {
        let cfg = Config::default();
        let settings = cfg.guardrail.settings();
        assert_eq!(settings, GuardrailSettings::default());
    }
}
