use adlens::{build_app, worker, AppState, Config};
use std::{sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        gemini = config.gemini_configured(),
        youtube = config.youtube_configured(),
        instagram = config.instagram_configured(),
        "external api credentials"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let sweep_every = Duration::from_secs(config.cache_sweep_interval.max(1));

    let state = Arc::new(AppState::from_config(config)?);
    tokio::spawn(worker::run_cache_sweeper(
        state.pipeline.cache().clone(),
        sweep_every,
    ));

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "adlens listening");

    axum::serve(listener, app).await?;
    Ok(())
}
