pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod worker;

pub use config::Config;
pub use error::{ApiError, Result};

use axum::{http::Method, Router};
use services::{export::Exporter, pipeline::Pipeline};
use std::{sync::Arc, time::Instant};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

pub struct AppState {
    pub config: Config,
    pub pipeline: Pipeline,
    pub exporter: Exporter,
    pub started_at: Instant,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(Self {
            pipeline: Pipeline::from_config(&config)?,
            exporter: Exporter::new(&config.exports_dir),
            started_at: Instant::now(),
            config,
        })
    }
}

fn build_cors(origins: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        // Development: allow all origins
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = build_cors(&state.config.cors_origins);

    // no TimeoutLayer: it answers 408, while a slow scrape must still get a 200
    Router::new()
        .merge(routes::api::routes())
        .merge(routes::status::routes())
        .fallback(routes::status::server_running)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
