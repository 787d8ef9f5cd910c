//! # Pero
//!
//! A cocktail-recipe service: free-text drink requests in, structured
//! recipes with a five-dimension taste profile out.
//!
//! The request logic lives in the `pero-core` crate and is pure apart from
//! its traits. This crate supplies the concrete backends (in-process or
//! Ollama embeddings, a JSON-file cache, the Gemini client), configuration,
//! and two presentation layers: the `pero` CLI and an HTTP JSON API.
//!
//! ## Architecture
//!
//! ```text
//!   request
//!      │
//!      ▼
//! ┌───────────┐ rejected  ┌──────────────┐
//! │ Guardrail │──────────▶│ refusal text │
//! └─────┬─────┘           └──────────────┘
//!       │ ok
//!       ▼
//! ┌───────────┐   hit
//! │   Cache   │──────────▶ recipe
//! └─────┬─────┘
//!       │ miss
//!       ▼
//! ┌───────────┐ failure   ┌──────────┐
//! │  Gemini   │──────────▶│ Fallback │
//! └─────┬─────┘           └────┬─────┘
//!       └───────────┬──────────┘
//!                   ▼
//!             cache write ──▶ recipe
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...          # optional; without it recipes come from the fallback
//! pero ask "Un cocktail frais au gin"
//! pero ask "Un mojito" --budget premium --json
//! pero check "Comment réparer mon vélo ?"
//! pero serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | fastembed and Ollama embedding providers |
//! | [`cache`] | JSON-file recipe store |
//! | [`generation`] | Gemini recipe generator |
//! | [`pipeline`] | Builds the orchestrator from configuration |
//! | [`ask`] | `ask` / `check` commands |
//! | [`cache_cmd`] | `cache list` / `cache show` commands |
//! | [`server`] | HTTP JSON API |

pub mod ask;
pub mod cache;
pub mod cache_cmd;
pub mod config;
pub mod embedding;
pub mod generation;
pub mod pipeline;
pub mod server;

pub use pero_core;
