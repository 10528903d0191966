mod auth;
mod config;
mod graphql;
mod http;
mod render;
mod service;
mod sitemap;
mod state;

use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Settings;
use http::router::build_router;
use service::CommentService;
use sitemap::SitemapState;
use state::AppState;
use storage::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url)
        .await
        .with_context(|| format!("Failed to open database: {}", settings.database.url))?;

    let (tx_events, _rx_events) = broadcast::channel(100);
    let service = CommentService::new(db.clone(), tx_events);

    let sitemap = SitemapState::new(&settings.site.deploy_url, Arc::new(db.clone()));
    let state = AppState::new(db, service, settings.security.admin_token.clone());

    let app = build_router(state, sitemap, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);
    info!("Sitemap root: {}", settings.site.deploy_url);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
