use std::sync::Arc;

use anyhow::Context;
use clinic_site_api::{build_app, AppConfig, AppState};
use clinic_site_core::analytics::SummaryPoller;
use clinic_site_core::content::ArticleSource;
use clinic_site_core::events::EventBus;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("Failed to load config")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting clinic site API server");

    let event_bus = EventBus::new(config.event_bus_capacity);
    let state = AppState::from_config(config.clone(), event_bus.clone());
    tracing::info!(backend = state.content().backend_tag(), "content store ready");

    match state.content().seed_from(&config.seed_content_file).await {
        Ok(true) => {}
        Ok(false) => tracing::debug!("content store already populated"),
        Err(e) if e.is_not_found() => tracing::info!(error = %e, "no seed content available"),
        Err(e) => tracing::warn!(error = %e, "seeding content store failed"),
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    let articles: Arc<dyn ArticleSource> = Arc::new(state.content().clone());
    let poller = SummaryPoller::spawn(
        state.analytics().clone(),
        articles,
        event_bus,
        config.analytics_poll_interval(),
    );

    let app = build_app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.cancel();
    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
