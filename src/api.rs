use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::digest::ReceivedNews;
use crate::history::NewsHistory;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const ENV_DATA_DIR: &str = "NEWSWIRE_DATA_DIR";

#[derive(Clone)]
pub struct AppState {
    pub history: Arc<NewsHistory>,
}

impl AppState {
    /// Persisting state rooted at `$NEWSWIRE_DATA_DIR` (default `data/`).
    pub fn from_env() -> Self {
        let dir = std::env::var(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        Self {
            history: Arc::new(NewsHistory::with_data_dir(dir)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            history: Arc::new(NewsHistory::in_memory()),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news", get(list_news).post(receive_news))
        .route("/api/news/latest", get(latest_news))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn receive_news(State(state): State<AppState>, Json(payload): Json<ReceivedNews>) -> Json<Value> {
    let n = payload.article_groups.len();
    tracing::info!(groups = n, timestamp = %payload.timestamp, "received news payload");
    state.history.push(payload);
    Json(json!({
        "status": "success",
        "message": format!("Received {n} article groups"),
    }))
}

async fn list_news(State(state): State<AppState>) -> Json<Vec<ReceivedNews>> {
    Json(state.history.all())
}

async fn latest_news(State(state): State<AppState>) -> Json<Value> {
    match state.history.latest() {
        Some(p) => Json(serde_json::to_value(p).unwrap_or(Value::Null)),
        None => Json(json!({ "message": "No news data available" })),
    }
}
