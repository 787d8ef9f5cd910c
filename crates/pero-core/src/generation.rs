//! Recipe generation contract and reply validation.
//!
//! A [`RecipeGenerator`] turns a request into a [`Recipe`] or a typed
//! [`GenerationError`]. The remote client in the app crate builds its
//! prompt with [`build_prompt`] and validates the service's reply with
//! [`parse_reply`]; both are pure so they are tested here without any
//! network.
//!
//! # Reply contract
//!
//! The reply must be a JSON object, optionally wrapped in a fenced code
//! block, with exactly these fields:
//!
//! | Field | Type |
//! |-------|------|
//! | `name` | string |
//! | `ingredients` | array of strings |
//! | `instructions` | string |
//! | `taste_profile` | object of the five dimension keys to numbers |
//!
//! A missing field is a failure. A missing or non-numeric taste dimension
//! is not: it takes the neutral score. Out-of-range scores are clamped.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Recipe, TasteDimension, TasteProfile};

/// Why a service reply could not be turned into a [`Recipe`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("reply is not valid JSON: {0}")]
    NotJson(String),
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("reply is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("reply field `{0}` has the wrong type")]
    WrongType(&'static str),
}

/// Why a generation attempt produced no recipe.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No credential configured; no request was sent.
    #[error("no API credential configured")]
    MissingCredential,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("service reply contained no text")]
    EmptyReply,
    #[error("invalid reply: {0}")]
    InvalidReply(#[from] ReplyError),
}

impl GenerationError {
    /// True when the service answered but the answer was unusable.
    pub fn is_invalid_reply(&self) -> bool {
        matches!(self, GenerationError::InvalidReply(_) | GenerationError::EmptyReply)
    }
}

/// A source of recipes for requests that missed the cache.
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// Short identifier used in logs (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Generate a recipe for `query`. The returned recipe carries
    /// `source_query == query`.
    async fn generate(&self, query: &str) -> Result<Recipe, GenerationError>;
}

/// Build the instruction prompt sent to the generation service.
pub fn build_prompt(query: &str) -> String {
    let keys = TasteDimension::ALL
        .iter()
        .map(|d| format!("\"{}\"", d.key()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Tu es un barman expert. Crée une recette de cocktail originale pour la demande suivante : \"{query}\".\n\
         Réponds UNIQUEMENT avec un objet JSON contenant exactement quatre champs :\n\
         - \"name\" : le nom du cocktail (chaîne)\n\
         - \"ingredients\" : la liste ordonnée des ingrédients avec leurs quantités (liste de chaînes)\n\
         - \"instructions\" : les étapes de préparation (chaîne)\n\
         - \"taste_profile\" : un objet avec les clés {keys}, chacune associée à un nombre entre 1.5 et 5.0\n\
         N'ajoute aucun texte avant ou après le JSON."
    )
}

/// Remove an optional fenced code block around a reply.
///
/// Accepts both ```` ```json\n{...}\n``` ```` and a bare body; anything
/// else is returned trimmed and left for the JSON parser to judge.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Validate a service reply and build the [`Recipe`] for `query`.
pub fn parse_reply(reply: &str, query: &str) -> Result<Recipe, ReplyError> {
    let value: Value = serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| ReplyError::NotJson(e.to_string()))?;
    let obj = value.as_object().ok_or(ReplyError::NotAnObject)?;

    let name = required_str(obj, "name")?;

    let ingredients = required(obj, "ingredients")?
        .as_array()
        .ok_or(ReplyError::WrongType("ingredients"))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or(ReplyError::WrongType("ingredients"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let instructions = required_str(obj, "instructions")?;

    let profile_obj = required(obj, "taste_profile")?
        .as_object()
        .ok_or(ReplyError::WrongType("taste_profile"))?;

    Ok(Recipe {
        name,
        ingredients,
        instructions,
        taste_profile: profile_from_object(profile_obj),
        source_query: query.to_string(),
    })
}

fn required<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ReplyError> {
    obj.get(field).ok_or(ReplyError::MissingField(field))
}

fn required_str(obj: &Map<String, Value>, field: &'static str) -> Result<String, ReplyError> {
    required(obj, field)?
        .as_str()
        .map(str::to_string)
        .ok_or(ReplyError::WrongType(field))
}

/// Dimension keys match case-insensitively; absent ones stay neutral.
fn profile_from_object(obj: &Map<String, Value>) -> TasteProfile {
    let mut profile = TasteProfile::default();
    for dim in TasteDimension::ALL {
        let value = obj.get(dim.key()).or_else(|| {
            obj.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(dim.key()))
                .map(|(_, v)| v)
        });
        if let Some(score) = value.and_then(Value::as_f64) {
            profile.set(dim, score);
        }
    }
    profile
}
