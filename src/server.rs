//! JSON HTTP API.
//!
//! Exposes the ingest and search pipeline over HTTP for browser frontends
//! and other services.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ingest` | Fetch, chunk, embed, and index a URL |
//! | `POST` | `/search` | Semantic search with optional re-ranking |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one envelope:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `no_chunks` (400), `embeddings_disabled`
//! (400), `fetch_failed` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::fetch;
use crate::ingest;
use crate::search;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and registers all
/// route handlers. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ingest", post(handle_ingest))
        .route("/search", post(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("websift server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"no_chunks"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn no_chunks(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "no_chunks".to_string(),
        message: message.into(),
    }
}

fn fetch_failed(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "fetch_failed".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps pipeline errors onto the most appropriate HTTP status. Search
/// needs embeddings, so a disabled provider is a client-fixable 400.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("embeddings") || msg.contains("disabled") {
        let mut e = bad_request(msg);
        e.code = "embeddings_disabled".to_string();
        e
    } else if msg.contains("must not be empty") || msg.contains("invalid") {
        bad_request(msg)
    } else {
        internal(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ingest ============

#[derive(Deserialize)]
struct IngestRequest {
    url: String,
}

#[derive(Serialize)]
struct IngestResponse {
    status: String,
    url: String,
    indexed: u64,
}

/// Handler for `POST /ingest`.
///
/// Fetches the URL, chunks it, embeds the chunks (when configured), and
/// indexes everything. A page that produces no chunks is a 400, matching
/// the CLI's "nothing to index" outcome.
async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    if req.url.trim().is_empty() {
        return Err(bad_request("url must not be empty"));
    }

    let html = fetch::fetch_page(&state.config.fetch, &req.url)
        .await
        .map_err(|e| fetch_failed(e.to_string()))?;

    let pool = db::connect(&state.config)
        .await
        .map_err(|e| internal(e.to_string()))?;

    let outcome = ingest::ingest_html(&state.config, &pool, &req.url, &html)
        .await
        .map_err(classify_error);
    pool.close().await;
    let outcome = outcome?;

    if outcome.chunks_written == 0 {
        return Err(no_chunks(format!("no indexable content at {}", req.url)));
    }

    Ok(Json(IngestResponse {
        status: "ok".to_string(),
        url: req.url,
        indexed: outcome.chunks_written,
    }))
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    k: Option<i64>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Serialize)]
struct SearchHit {
    text: String,
    html: String,
    path: String,
    url: String,
    score: f64,
}

/// Handler for `POST /search`.
async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let k = req.k.unwrap_or(state.config.retrieval.final_limit);
    if k < 1 {
        return Err(bad_request("k must be >= 1"));
    }

    let pool = db::connect(&state.config)
        .await
        .map_err(|e| internal(e.to_string()))?;

    let results = search::search_chunks(&state.config, &pool, &req.query, k)
        .await
        .map_err(classify_error);
    pool.close().await;
    let results = results?;

    Ok(Json(SearchResponse {
        results: results
            .into_iter()
            .map(|r| SearchHit {
                text: r.text,
                html: r.html,
                path: r.path,
                url: r.url,
                score: (r.score * 100.0).round() / 100.0,
            })
            .collect(),
    }))
}
