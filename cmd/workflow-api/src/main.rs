mod config;
mod error;
mod middleware;
mod routes;

use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workflow_analysis::AnalysisService;

use crate::{config::Config, routes::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}={level},workflow_analysis={level},tower_http=debug",
                    env!("CARGO_CRATE_NAME"),
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Initialize shared state
    let service = AnalysisService::from_config(config.analysis.clone())
        .context("Failed to initialize analysis service")?;

    tracing::info!(
        port = config.port,
        provider = service.provider_name(),
        call_timeout_secs = config.analysis.call_timeout_secs,
        "Starting workflow analysis API"
    );

    let shutdown = CancellationToken::new();
    let state = AppState {
        service: Arc::new(service),
        shutdown: shutdown.clone(),
        token_prefix: Arc::from(config.token_prefix.as_str()),
    };

    // Build application router
    let app = routes::app(state, config.max_concurrency)
        // Middleware layers (bottom to top)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C and cancels in-flight analyses
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
    shutdown.cancel();
}
