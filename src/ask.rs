//! `pero ask` and `pero check` commands.
//!
//! Both build the pipeline from configuration, run one request and print
//! either a human-readable rendering or, with `--json`, the serialized
//! result (the same shape the HTTP server returns).

use anyhow::Result;
use std::fmt::Write as _;

use pero_core::models::{Budget, Outcome, Recipe, RelevanceResult, MAX_TASTE_SCORE};

use crate::config::Config;
use crate::pipeline::{build_orchestrator, prepare_query};

pub async fn run_ask(config: &Config, query: &str, budget: Option<Budget>, json: bool) -> Result<()> {
    let query = prepare_query(query, budget)?;
    let orchestrator = build_orchestrator(config)?;
    let outcome = orchestrator.handle(&query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_outcome(&outcome));
    }
    Ok(())
}

pub async fn run_check(config: &Config, text: &str, json: bool) -> Result<()> {
    let text = prepare_query(text, None)?;
    let orchestrator = build_orchestrator(config)?;
    let result = orchestrator.check_relevance(&text).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_relevance(&result));
    }
    Ok(())
}

pub fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Rejected { message } => format!("{}\n", message),
        Outcome::Ok { recipe, cache_hit } => {
            let mut out = render_recipe(recipe);
            if *cache_hit {
                out.push_str("\n(from cache)\n");
            }
            out
        }
    }
}

pub fn render_recipe(recipe: &Recipe) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🍸 {}", recipe.name);
    let _ = writeln!(out);
    let _ = writeln!(out, "Ingrédients:");
    for ingredient in &recipe.ingredients {
        let _ = writeln!(out, "  - {}", ingredient);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Préparation:");
    let _ = writeln!(out, "  {}", recipe.instructions);
    let _ = writeln!(out);
    let _ = writeln!(out, "Profil gustatif:");
    for (dim, score) in recipe.taste_profile.iter() {
        let _ = writeln!(out, "  {:<11} {} {:.1}", dim.key(), bar(score), score);
    }
    out
}

pub fn render_relevance(result: &RelevanceResult) -> String {
    let mut out = format!("{:?} (score {:.3})", result.verdict, result.score).to_lowercase();
    if let Some(keyword) = &result.matched_keyword {
        let _ = write!(out, ", closest keyword: {}", keyword);
    }
    out.push('\n');
    if let Some(reason) = &result.reason {
        let _ = writeln!(out, "{}", reason);
    }
    out
}

fn bar(score: f64) -> String {
    let filled = score.round().clamp(0.0, MAX_TASTE_SCORE) as usize;
    let total = MAX_TASTE_SCORE as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(total - filled))
}
