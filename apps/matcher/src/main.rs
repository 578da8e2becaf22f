mod config;
mod errors;
mod matching;
mod models;
mod routes;
mod scoring_client;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::scoring_client::ScoringClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matcher v{}", env!("CARGO_PKG_VERSION"));

    let scoring = ScoringClient::new(config.scoring_service_url.clone(), config.request_timeout)?;
    info!(
        "Scoring service at {} (analysis timeout {}s, order: {:?})",
        config.scoring_service_url,
        config.analysis_timeout.as_secs(),
        config.top_category_order
    );

    let state = AppState::new(config.clone(), Arc::new(scoring));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
