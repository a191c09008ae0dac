use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use webdex_core::{DocId, SearchEngine, SearchResult};

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let engine = SearchEngine::open(&index_dir)?;
    // Load the lexicon up front so the first query doesn't pay for it
    engine.reader().load_lexicon()?;
    let stats = engine.reader().stats()?;
    tracing::info!(index = %index_dir, num_docs = stats.num_documents, "index opened");
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

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, MAX_K);
    let engine = state.engine.clone();
    let q = params.q.clone();
    // postings are read from disk, keep that off the async workers
    let ranked = tokio::task::spawn_blocking(move || engine.rank(&q))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %e, query = %params.q, "search failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let total_hits = ranked.len();
    let results = ranked.into_iter().take(k).collect();
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.engine.reader().get_document(doc_id) {
        Ok(Some(doc)) => (StatusCode::OK, Json(serde_json::json!(doc))),
        Ok(None) => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))),
    }
}
