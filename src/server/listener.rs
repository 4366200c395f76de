//! TCP listener and HTTP server loop

use super::handlers::{create_lobby, health_check, list_lobbies, reap_lobby, update_lobby};
use crate::lobby::LobbyRegistry;
use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

/// Build the lobby API router over a registry
pub fn router(registry: LobbyRegistry) -> Router {
    Router::new()
        .route(
            "/lobby",
            get(list_lobbies).post(create_lobby).put(update_lobby),
        )
        .route("/reap/{port}", get(reap_lobby))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// HTTP front end for a [`LobbyRegistry`]
pub struct LobbyServer {
    listener: TcpListener,
    registry: LobbyRegistry,
}

impl LobbyServer {
    /// Bind the listening socket
    pub async fn bind(addr: &str, registry: LobbyRegistry) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        Ok(Self { listener, registry })
    }

    /// Address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until a shutdown signal arrives or the sender is dropped
    pub async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!("Lobby API listening on {}", addr);

        axum::serve(self.listener, router(self.registry))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await
            .context("HTTP server error")?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
