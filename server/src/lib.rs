use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use search_core::config::DEFAULT_TOP_K;
use search_core::persist::open_with_retry;
use search_core::{Bm25Engine, Bm25Params, DocumentStats, IndexError, RetryPolicy, SearchHit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_K }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Bm25Engine>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

/// Open the on-disk index at `index_dir` and build the router around it.
pub fn build_app(index_dir: &str, params: Bm25Params) -> Result<Router> {
    let store = open_with_retry(index_dir, RetryPolicy::default())?;
    if let Some(meta) = store.meta()? {
        tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, generation = meta.generation, created_at = %meta.created_at, "index loaded");
    }
    let engine = Bm25Engine::new(Arc::new(store), params)?;
    Ok(app_with_engine(engine))
}

pub fn app_with_engine(engine: Bm25Engine) -> Router {
    let app_state = AppState { engine: Arc::new(engine) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, MAX_K);
    let engine = state.engine.clone();
    let query = params.q.clone();
    // store reads block
    let outcome = tokio::task::spawn_blocking(move || engine.search_hits(&query, k))
        .await
        .map_err(|e| internal(e.to_string()))?
        .map_err(index_error)?;

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits = outcome.total_hits, took_s = elapsed.as_secs_f64(), "search served");
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: outcome.total_hits, results: outcome.hits }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<DocumentStats>, ApiError> {
    let engine = state.engine.clone();
    let found = tokio::task::spawn_blocking(move || engine.store().document(&doc_id))
        .await
        .map_err(|e| internal(e.to_string()))?
        .map_err(index_error)?;
    match found {
        Some(stats) => Ok(Json(stats)),
        None => Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))),
    }
}

fn index_error(e: IndexError) -> ApiError {
    match e {
        IndexError::IndexUnavailable => (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({ "error": e.to_string() }))),
        other => internal(other.to_string()),
    }
}

fn internal(msg: String) -> ApiError {
    tracing::error!(error = %msg, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": msg })))
}
