//! HTTP JSON API.
//!
//! Thin presentation layer over [`RecipeOrchestrator`]: one shared
//! pipeline per process, one request in, one outcome out.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/relevance` | Relevance verdict for `{ "text": "..." }` |
//! | `POST` | `/recipe` | Recipe or refusal for `{ "query": "...", "budget": "premium" }` |
//!
//! `POST /recipe` answers `200` for both outcomes; the body carries
//! `"status": "ok"` (with `recipe` and `cache_hit`) or
//! `"status": "rejected"` (with `message`).
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400) for malformed or empty input,
//! `internal` (500) when the embedding model cannot be loaded or run.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use pero_core::models::{Budget, Outcome, RelevanceResult};
use pero_core::orchestrator::RecipeOrchestrator;

use crate::config::Config;
use crate::pipeline::{build_orchestrator, prepare_query};

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<RecipeOrchestrator>,
}

/// Starts the HTTP server on `[server].bind` with a pipeline built from
/// `config`. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config)?);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    serve(listener, orchestrator).await
}

/// Serve an already-built pipeline on an already-bound listener.
///
/// Lets tests and embedders supply their own embedding provider, store
/// and generator.
pub async fn serve(
    listener: tokio::net::TcpListener,
    orchestrator: Arc<RecipeOrchestrator>,
) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, "recipe server listening");
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

pub fn router(orchestrator: Arc<RecipeOrchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/relevance", post(handle_relevance))
        .route("/recipe", post(handle_recipe))
        .layer(cors)
        .with_state(AppState { orchestrator })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    error!(error = %format!("{:#}", err), "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: format!("{:#}", err),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ POST /relevance ============

#[derive(Deserialize)]
struct RelevanceRequest {
    text: String,
}

async fn handle_relevance(
    State(state): State<AppState>,
    body: Result<Json<RelevanceRequest>, JsonRejection>,
) -> Result<Json<RelevanceResult>, AppError> {
    let Json(req) = body?;
    let text = prepare_query(&req.text, None).map_err(|_| bad_request("text must not be empty"))?;

    let result = state
        .orchestrator
        .check_relevance(&text)
        .await
        .map_err(internal)?;
    Ok(Json(result))
}

// ============ POST /recipe ============

#[derive(Deserialize)]
struct RecipeRequest {
    query: String,
    #[serde(default)]
    budget: Option<String>,
}

async fn handle_recipe(
    State(state): State<AppState>,
    body: Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<Json<Outcome>, AppError> {
    let Json(req) = body?;

    let budget = req
        .budget
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .map(str::parse::<Budget>)
        .transpose()
        .map_err(bad_request)?;

    let query =
        prepare_query(&req.query, budget).map_err(|_| bad_request("query must not be empty"))?;

    let outcome = state.orchestrator.handle(&query).await.map_err(internal)?;
    Ok(Json(outcome))
}
