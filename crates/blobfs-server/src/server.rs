use std::future::Future;
use std::sync::Arc;

use blobfs_store::{BlobStorage, FsBlobStore};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// blobfs HTTP server.
pub struct BlobServer {
    config: ServerConfig,
    storage: Arc<dyn BlobStorage>,
}

impl BlobServer {
    /// Open the local store named by `config` and wrap it in a server.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = FsBlobStore::open(config.store.clone())?;
        Ok(Self::with_storage(config, Arc::new(store)))
    }

    /// Serve an already constructed backend, local or remote.
    pub fn with_storage(config: ServerConfig, storage: Arc<dyn BlobStorage>) -> Self {
        Self { config, storage }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState::new(Arc::clone(&self.storage), self.config.mime_policy);
        build_router(state, self.config.max_body_size)
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on an existing listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        info!("blobfs server listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!("blobfs server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
