// src/server/mod.rs
//! mspm catalog server
//!
//! Exposes a [`CatalogServer`] over HTTP with JSON bodies. The catalog itself
//! is synchronous; handlers hand each request to the blocking pool.

mod handlers;
mod routes;

pub use handlers::ApiError;
pub use routes::create_router;

use crate::catalog::StoreLock;
use crate::config::MspmConfig;
use crate::service::CatalogServer;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Staging area for in-flight uploads
    pub playground: PathBuf,
    /// Durable area for sealed archives
    pub store: PathBuf,
    /// Largest accepted upload request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let defaults = MspmConfig::default();
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 10240)),
            playground: defaults.storage.playground,
            store: defaults.storage.store,
            max_upload_bytes: defaults.server.max_upload_bytes,
        }
    }
}

impl ServerConfig {
    /// Build a server configuration from the parsed config file
    pub fn from_config(config: &MspmConfig) -> crate::Result<Self> {
        Ok(Self {
            bind_addr: config.listen_addr()?,
            playground: config.storage.playground.clone(),
            store: config.storage.store.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

/// Shared server state
#[derive(Debug)]
pub struct ServerState {
    pub config: ServerConfig,
    pub catalog: CatalogServer,
}

impl ServerState {
    pub fn new(config: ServerConfig, catalog: CatalogServer) -> Self {
        Self { config, catalog }
    }
}

/// Run the catalog server until it is shut down
///
/// The store lock is taken before the catalog is opened and held until the
/// server exits.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting mspm catalog on {}", config.bind_addr);
    tracing::info!("Playground: {:?}", config.playground);
    tracing::info!("Store: {:?}", config.store);

    let _lock = StoreLock::acquire(&config.store).context("Failed to lock store")?;

    let catalog = CatalogServer::open(config.playground.clone(), config.store.clone())
        .context("Failed to open catalog")?;
    let state = Arc::new(ServerState::new(config.clone(), catalog));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("mspm catalog is ready to serve");

    axum::serve(listener, app).await?;
    Ok(())
}
