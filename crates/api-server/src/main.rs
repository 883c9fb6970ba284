//! API Server for Agent Hub
//!
//! Hosts one configured agent behind a framework-agnostic HTTP surface:
//! JSON invocation, server-sent event streaming and a diagnostic config
//! endpoint.

mod config;
mod demo;
mod error;
mod routes;
mod sse;
mod state;

use agent_runner::FrameworkCatalog;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{HostConfig, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api_server=debug,agent_runner=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!("Using data directory: {:?}", config.data_dir);
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let host = match &config.host_config {
        Some(path) => {
            tracing::info!("Loading host config from {:?}", path);
            HostConfig::load(path).await?
        }
        None => {
            tracing::info!("No host config given, hosting the built-in echo agent");
            HostConfig::echo(&config.data_dir)
        }
    };

    let mut catalog = FrameworkCatalog::new();
    demo::register(&mut catalog);
    let state = AppState::from_host(&host, catalog, config.router_config()).await?;
    let handle = state.handle().clone();

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("REST API listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, closing agent {}", handle.id());
    handle.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
