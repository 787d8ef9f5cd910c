//! Deterministic keyword-driven recipe generator.
//!
//! Used when the remote service is unavailable or its reply is unusable,
//! so that every accepted request still ends with a recipe.
//!
//! Classification walks [`FALLBACK_RULES`] in order and picks the first
//! rule with a keyword contained in the lowercased request. When nothing
//! matches, [`DEFAULT_RULE`] applies.

use crate::models::{Recipe, TasteProfile};

/// One entry of the fallback classification table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackRule {
    /// Identifier used in logs and tests.
    pub group: &'static str,
    /// Lowercase substrings that select this rule.
    pub keywords: &'static [&'static str],
    pub base_spirit: &'static str,
    pub taste_profile: TasteProfile,
}

impl FallbackRule {
    pub fn matches(&self, normalized_query: &str) -> bool {
        self.keywords.iter().any(|k| normalized_query.contains(k))
    }
}

/// Rules in priority order: freshness, strength, tropical, bitterness.
pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        group: "freshness",
        keywords: &[
            "frais",
            "fraîche",
            "fraiche",
            "rafraîchissant",
            "rafraichissant",
            "menthe",
            "léger",
            "leger",
            "fresh",
            "mint",
            "mojito",
        ],
        base_spirit: "Rhum blanc",
        taste_profile: TasteProfile::new(3.0, 3.5, 1.5, 2.5, 5.0),
    },
    FallbackRule {
        group: "strength",
        keywords: &[
            "fort",
            "corsé",
            "corse",
            "puissant",
            "strong",
            "whisky",
            "bourbon",
        ],
        base_spirit: "Whisky",
        taste_profile: TasteProfile::new(2.0, 1.5, 3.0, 5.0, 1.5),
    },
    FallbackRule {
        group: "tropical",
        keywords: &[
            "fruit",
            "tropical",
            "exotique",
            "ananas",
            "mangue",
            "passion",
            "coco",
            "agrume",
        ],
        base_spirit: "Rhum ambré",
        taste_profile: TasteProfile::new(4.5, 3.0, 1.5, 2.5, 3.5),
    },
    FallbackRule {
        group: "bitterness",
        keywords: &["amer", "bitter", "campari", "negroni", "spritz"],
        base_spirit: "Gin",
        taste_profile: TasteProfile::new(1.5, 2.0, 5.0, 3.5, 2.5),
    },
];

/// Rule used when no entry of [`FALLBACK_RULES`] matches.
pub static DEFAULT_RULE: FallbackRule = FallbackRule {
    group: "neutral",
    keywords: &[],
    base_spirit: "Vodka",
    taste_profile: TasteProfile::new(3.0, 3.0, 2.0, 3.0, 3.0),
};

/// Pick the rule for a request.
pub fn classify(query: &str) -> &'static FallbackRule {
    let normalized = query.to_lowercase();
    FALLBACK_RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .unwrap_or(&DEFAULT_RULE)
}

/// Build a recipe for `query` without any external service. Never fails.
pub fn generate_fallback(query: &str) -> Recipe {
    let rule = classify(query);
    let spirit = rule.base_spirit;

    Recipe {
        name: format!("Création du Barman · {}", spirit),
        ingredients: vec![
            format!("5 cl de {}", spirit.to_lowercase()),
            "2 cl de jus de citron vert".to_string(),
            "1,5 cl de sirop de sucre de canne".to_string(),
            "Glaçons".to_string(),
        ],
        instructions: format!(
            "1. Remplir un shaker de glaçons. \
             2. Ajouter 5 cl de {}, le jus de citron vert et le sirop. \
             3. Secouer vigoureusement pendant 10 secondes. \
             4. Filtrer dans un verre rafraîchi et servir aussitôt.",
            spirit.to_lowercase()
        ),
        taste_profile: rule.taste_profile,
        source_query: query.to_string(),
    }
}
