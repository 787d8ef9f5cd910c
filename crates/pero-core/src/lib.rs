//! # Pero Core
//!
//! Pure request-pipeline logic for Pero: data models, the relevance
//! guardrail, cache-key derivation and the recipe store trait, reply
//! validation, the fallback generator, and the orchestrator that ties
//! them together.
//!
//! This crate performs no filesystem or network I/O. Embedding backends,
//! the JSON file store and the remote generation client live in the
//! `pero` app crate and are injected through the [`embedding`],
//! [`store`] and [`generation`] traits.

pub mod embedding;
pub mod fallback;
pub mod generation;
pub mod guardrail;
pub mod models;
pub mod orchestrator;
pub mod store;
