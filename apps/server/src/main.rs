//! HTTP server for the release catalog: synced releases, events, and the
//! background sync scheduler.

use anyhow::Result;
use tracing::{info, warn};

mod api;
mod config;
mod error;
mod main_lib;
mod scheduler;
#[cfg(test)]
mod test_support;

use config::Config;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting releasesync-server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Data dir {}, {} sync queries, failure policy {:?}",
        config.data_dir.display(),
        config.queries.len(),
        config.failure_policy
    );
    if !config.sync_enabled() {
        warn!("CATALOG_CLIENT_ID / CATALOG_CLIENT_SECRET not set; release sync disabled");
    }
    if config.ticketmaster.is_none() {
        info!("TICKETMASTER_API_KEY not set; upcoming events feed disabled");
    }

    let state = main_lib::build_state(config)?;
    scheduler::ensure_scheduler_started(state.clone()).await;

    let listen_addr = state.config.listen_addr.clone();
    let app = api::app_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("releasesync-server listening on http://{}", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler::ensure_scheduler_stopped(&state).await;
    info!("Server stopped");
    Ok(())
}
