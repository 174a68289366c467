use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(status))
        .route("/health", get(health))
        .route("/api-status", get(api_status))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cache = state.pipeline.cache();
    let cache_entries = cache.len().await;

    Json(json!({
        "status": "online",
        "timestamp": Utc::now().to_rfc3339(),
        "geminiAPI": state.config.gemini_configured(),
        "serverStartTime": state.started_at.elapsed().as_secs_f64(),
        "cacheEntries": cache_entries,
        "cacheTtlSecs": cache.ttl().num_seconds(),
        "endpoints": {
            "scrape": "/scrape",
            "status": "/status",
            "health": "/health",
            "apiStatus": "/api-status",
            "exportCsv": "/export-csv",
            "generateReport": "/generate-report",
        },
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "timestamp": Utc::now().to_rfc3339(),
        "geminiAPI": state.config.gemini_configured(),
    }))
}

async fn api_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "apis": {
            "gemini": state.config.gemini_configured(),
            "youtube": state.config.youtube_configured(),
            "instagram": state.config.instagram_configured(),
        },
        "serverTime": Utc::now().to_rfc3339(),
    }))
}

/// Unknown routes still answer 200 so the UI never reads the server as down.
pub async fn server_running() -> Json<Value> {
    Json(json!({
        "status": true,
        "serverStatus": "online",
        "message": "Server is running",
    }))
}
