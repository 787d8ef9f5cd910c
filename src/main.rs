//! # Pero CLI (`pero`)
//!
//! ## Usage
//!
//! ```bash
//! pero --config ./config/pero.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pero ask "<request>"` | Answer a drink request with a recipe or a refusal |
//! | `pero check "<text>"` | Show the relevance verdict only |
//! | `pero cache list` | List cached recipes |
//! | `pero cache show "<request>"` | Print the cached recipe for a request |
//! | `pero serve` | Start the HTTP JSON API |
//!
//! Logs go to stderr and are filtered by `RUST_LOG` (default `pero=info`),
//! so `--json` output on stdout stays machine-readable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pero::pero_core::models::Budget;
use pero::{ask, cache_cmd, config, server};

/// Pero: cocktail recipes from free-text requests.
#[derive(Parser)]
#[command(name = "pero", version, about = "Pero: cocktail recipes from free-text requests")]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/pero.toml`. A missing file means all defaults.
    #[arg(long, global = true, default_value = "./config/pero.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a drink request.
    ///
    /// Runs the relevance check, then the cache, then remote generation,
    /// falling back to a deterministic recipe when the remote service is
    /// unavailable.
    Ask {
        /// The request, e.g. "Un cocktail frais au gin".
        query: String,

        /// Budget tier: economique, modere, premium, or luxe.
        #[arg(long)]
        budget: Option<Budget>,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the relevance verdict for a text without generating anything.
    Check {
        text: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect the recipe cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Start the HTTP JSON API on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum CacheAction {
    /// List every cached recipe.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print the cached recipe for a request (budget included, if any).
    Show {
        query: String,

        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pero=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ask {
            query,
            budget,
            json,
        } => {
            ask::run_ask(&cfg, &query, budget, json).await?;
        }
        Commands::Check { text, json } => {
            ask::run_check(&cfg, &text, json).await?;
        }
        Commands::Cache { action } => match action {
            CacheAction::List { json } => {
                cache_cmd::run_cache_list(&cfg, json).await?;
            }
            CacheAction::Show { query, json } => {
                cache_cmd::run_cache_show(&cfg, &query, json).await?;
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
