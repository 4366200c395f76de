//! Wire types for the lobby HTTP API
//!
//! Lobbies themselves travel as [`crate::lobby::Lobby`]. Request bodies only
//! read the fields each operation needs; anything else in the JSON is ignored.

use serde::{Deserialize, Serialize};

/// Body of `POST /lobby`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLobbyRequest {
    pub name: String,

    /// Advisory only; the registry assigns capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
}

/// Body of `PUT /lobby`, sent by workers to report occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLobbyRequest {
    pub host: String,
    pub port: u16,
    pub num_players: u32,
}

/// Error envelope returned with every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
