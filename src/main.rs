use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod config;
mod critique;
mod handlers;
mod llm;
mod utils;

use config::{API_KEY_ENV, CONFIG};
use handlers::http::create_router;
use utils::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging(&CONFIG);
    for warning in &CONFIG.warnings {
        warn!("{}", warning);
    }

    if !CONFIG.has_api_key() {
        warn!(
            "{} is not set; critique requests will fail until it is configured",
            API_KEY_ENV
        );
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        "Starting design critic on {} (model={}, endpoint={})",
        addr, CONFIG.model, CONFIG.api_url
    );

    let router = create_router(Arc::new(CONFIG.clone()));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
    }
}
