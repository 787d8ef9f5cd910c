//! Core data models used throughout Pero.
//!
//! These types describe what flows through the request pipeline: the
//! generated [`Recipe`] with its [`TasteProfile`], the guardrail's
//! [`RelevanceResult`], and the terminal [`Outcome`] handed back to callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest score a taste dimension may carry.
pub const MIN_TASTE_SCORE: f64 = 1.5;
/// Highest score a taste dimension may carry.
pub const MAX_TASTE_SCORE: f64 = 5.0;
/// Score assigned to a dimension the generator did not provide.
pub const NEUTRAL_TASTE_SCORE: f64 = 3.0;

fn neutral_score() -> f64 {
    NEUTRAL_TASTE_SCORE
}

/// The five fixed dimensions of a [`TasteProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TasteDimension {
    Sweetness,
    Acidity,
    Bitterness,
    Strength,
    Freshness,
}

impl TasteDimension {
    /// Every dimension, in display order.
    pub const ALL: [TasteDimension; 5] = [
        TasteDimension::Sweetness,
        TasteDimension::Acidity,
        TasteDimension::Bitterness,
        TasteDimension::Strength,
        TasteDimension::Freshness,
    ];

    /// The key used for this dimension in JSON documents.
    pub fn key(self) -> &'static str {
        match self {
            TasteDimension::Sweetness => "Sweetness",
            TasteDimension::Acidity => "Acidity",
            TasteDimension::Bitterness => "Bitterness",
            TasteDimension::Strength => "Strength",
            TasteDimension::Freshness => "Freshness",
        }
    }
}

/// Scores in `[1.5, 5.0]` for each of the five taste dimensions.
///
/// All five fields are always present. When deserializing, a missing
/// dimension takes [`NEUTRAL_TASTE_SCORE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TasteProfile {
    #[serde(rename = "Sweetness", default = "neutral_score")]
    pub sweetness: f64,
    #[serde(rename = "Acidity", default = "neutral_score")]
    pub acidity: f64,
    #[serde(rename = "Bitterness", default = "neutral_score")]
    pub bitterness: f64,
    #[serde(rename = "Strength", default = "neutral_score")]
    pub strength: f64,
    #[serde(rename = "Freshness", default = "neutral_score")]
    pub freshness: f64,
}

impl TasteProfile {
    pub const fn new(
        sweetness: f64,
        acidity: f64,
        bitterness: f64,
        strength: f64,
        freshness: f64,
    ) -> Self {
        Self {
            sweetness,
            acidity,
            bitterness,
            strength,
            freshness,
        }
    }

    pub fn get(&self, dim: TasteDimension) -> f64 {
        match dim {
            TasteDimension::Sweetness => self.sweetness,
            TasteDimension::Acidity => self.acidity,
            TasteDimension::Bitterness => self.bitterness,
            TasteDimension::Strength => self.strength,
            TasteDimension::Freshness => self.freshness,
        }
    }

    /// Sets a dimension, clamping the value into `[1.5, 5.0]`.
    pub fn set(&mut self, dim: TasteDimension, value: f64) {
        let value = value.clamp(MIN_TASTE_SCORE, MAX_TASTE_SCORE);
        match dim {
            TasteDimension::Sweetness => self.sweetness = value,
            TasteDimension::Acidity => self.acidity = value,
            TasteDimension::Bitterness => self.bitterness = value,
            TasteDimension::Strength => self.strength = value,
            TasteDimension::Freshness => self.freshness = value,
        }
    }

    /// Iterate `(dimension, score)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (TasteDimension, f64)> + '_ {
        TasteDimension::ALL.iter().map(move |&d| (d, self.get(d)))
    }
}

impl Default for TasteProfile {
    fn default() -> Self {
        Self::new(
            NEUTRAL_TASTE_SCORE,
            NEUTRAL_TASTE_SCORE,
            NEUTRAL_TASTE_SCORE,
            NEUTRAL_TASTE_SCORE,
            NEUTRAL_TASTE_SCORE,
        )
    }
}

/// A generated cocktail recipe.
///
/// This is also the value persisted in the recipe cache. Entries written
/// by older releases used `query` instead of `source_query` and may lack
/// a `taste_profile`; both still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    #[serde(default)]
    pub taste_profile: TasteProfile,
    /// The request text this recipe was produced for.
    #[serde(default, alias = "query")]
    pub source_query: String,
}

/// Whether the guardrail let a request through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ok,
    Rejected,
}

/// Result of a relevance check.
///
/// `verdict` is [`Verdict::Ok`] exactly when `score >= threshold`;
/// `reason` is present exactly when the request was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceResult {
    pub verdict: Verdict,
    /// Maximum cosine similarity against the keyword set.
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Keyword that produced `score`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
}

impl RelevanceResult {
    pub fn is_ok(&self) -> bool {
        self.verdict == Verdict::Ok
    }
}

/// What the orchestrator hands back for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Ok { recipe: Recipe, cache_hit: bool },
    Rejected { message: String },
}

/// Budget tier a request can be qualified with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Economique,
    Modere,
    Premium,
    Luxe,
}

impl Budget {
    pub fn label(self) -> &'static str {
        match self {
            Budget::Economique => "Economique (< 8€)",
            Budget::Modere => "Modere (8-15€)",
            Budget::Premium => "Premium (15-25€)",
            Budget::Luxe => "Luxe (> 25€)",
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Budget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "economique" | "économique" => Ok(Budget::Economique),
            "modere" | "modéré" => Ok(Budget::Modere),
            "premium" => Ok(Budget::Premium),
            "luxe" => Ok(Budget::Luxe),
            other => Err(format!(
                "unknown budget '{}': expected economique, modere, premium, or luxe",
                other
            )),
        }
    }
}

/// Qualify a request with a budget tier, as `"<query> (budget: <label>)"`.
///
/// The enriched text is what reaches the guardrail and the cache, so the
/// same request under two budgets yields two cache entries.
pub fn enrich_query(query: &str, budget: Option<Budget>) -> String {
    match budget {
        Some(b) => format!("{} (budget: {})", query, b.label()),
        None => query.to_string(),
    }
}
