//! Serve mode — storage lifecycle plus the HTTP server.

use std::net::SocketAddr;

use devstore_core::{DevstoreConfig, NamespaceManager, Registry};
use devstore_state::StateStore;
use tracing::{error, info};

pub async fn run(config: DevstoreConfig) -> anyhow::Result<()> {
    info!("devstore daemon starting");

    // ── State store ────────────────────────────────────────────
    let store = if config.storage.in_memory {
        info!("using in-memory state store; nothing will be persisted");
        StateStore::open_in_memory()?
    } else {
        std::fs::create_dir_all(&config.storage.data_dir)?;
        let db_path = config.db_path();
        let store = StateStore::open(&db_path)?;
        info!(path = ?db_path, "state store opened");
        store
    };

    let developers = Registry::new(store.clone(), NamespaceManager::new(store.clone())).count()?;
    info!(developers, "registry loaded");

    // ── API server ─────────────────────────────────────────────
    let router = devstore_api::build_router(store.clone());
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    info!(%addr, "API server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Last handle; closes the database.
    drop(store);
    info!("devstore daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
