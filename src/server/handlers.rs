//! HTTP handlers for the lobby API

use super::error::ApiError;
use crate::lobby::{Lobby, LobbyRegistry};
use crate::protocol::{CreateLobbyRequest, UpdateLobbyRequest};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

/// GET /lobby
pub async fn list_lobbies(State(registry): State<LobbyRegistry>) -> Json<Vec<Lobby>> {
    Json(registry.list().await)
}

/// POST /lobby - spawn a worker and advertise it
pub async fn create_lobby(
    State(registry): State<LobbyRegistry>,
    Json(req): Json<CreateLobbyRequest>,
) -> Result<(StatusCode, Json<Lobby>), ApiError> {
    let lobby = registry.create(req.name, req.max_players).await?;
    Ok((StatusCode::CREATED, Json(lobby)))
}

/// PUT /lobby - worker reports its player count
pub async fn update_lobby(
    State(registry): State<LobbyRegistry>,
    Json(req): Json<UpdateLobbyRequest>,
) -> Result<StatusCode, ApiError> {
    registry.update(&req.host, req.port, req.num_players).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /reap/{port} - arm a managed-host lobby for the next sweep
pub async fn reap_lobby(
    State(registry): State<LobbyRegistry>,
    Path(port): Path<u16>,
) -> Result<StatusCode, ApiError> {
    let host = registry.managed_host().to_string();
    registry.reap(&host, port).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
