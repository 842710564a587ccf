//! orbitcast HTTP server binary.
//!
//! Builds the bus, store and oracle, starts the subscription workers and
//! serves the REST API until Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin orbitcast-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`, `PORT`: bind address (default 0.0.0.0:8080)
//! - `ORBITCAST_*`: overrides listed in [`orbitcast::config::ServiceConfig`]
//! - `RUST_LOG`: log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use orbitcast::bus::MessageBus;
use orbitcast::config::ServiceConfig;
use orbitcast::db::LocalRepository;
use orbitcast::http::{create_router, AppState};
use orbitcast::oracle::Sgp4Oracle;
use orbitcast::services::TrackingEngine;
use orbitcast::workers::spawn_workers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting orbitcast server");

    let config = ServiceConfig::load().context("failed to load configuration")?;
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;

    let bus = MessageBus::new(config.bus.channel_capacity);
    let store = Arc::new(LocalRepository::new(bus.clone()));
    let engine = TrackingEngine::new(Arc::new(Sgp4Oracle), store, config);

    let workers = spawn_workers(engine.clone(), &bus);
    info!(workers = workers.len(), "subscription workers started");

    let app = create_router(AppState::new(engine, bus.clone()));

    info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(bus))
        .await?;

    info!("HTTP server stopped, shutting down workers");
    workers.shutdown().await;
    Ok(())
}

/// Resolves on Ctrl-C. Closing the bus ends open position streams so the
/// server can drain its connections.
async fn shutdown_signal(bus: MessageBus) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    bus.close();
}
