//! Client - talks to a running lobby-balancer over HTTP

use crate::lobby::Lobby;
use crate::protocol::{CreateLobbyRequest, ErrorBody, UpdateLobbyRequest};
use anyhow::{anyhow, Context, Result};
use reqwest::{Response, StatusCode};

/// HTTP client for the lobby API
#[derive(Debug, Clone)]
pub struct LobbyClient {
    base_url: String,
    http: reqwest::Client,
}

impl LobbyClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:8000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List all lobbies
    pub async fn list(&self) -> Result<Vec<Lobby>> {
        let resp = self
            .http
            .get(self.url("/lobby"))
            .send()
            .await
            .context("Failed to reach lobby server")?;
        Ok(check(resp).await?.json().await?)
    }

    /// Ask the server to spawn a new lobby
    pub async fn create(&self, name: &str) -> Result<Lobby> {
        let body = CreateLobbyRequest {
            name: name.to_string(),
            max_players: None,
        };
        let resp = self
            .http
            .post(self.url("/lobby"))
            .json(&body)
            .send()
            .await
            .context("Failed to reach lobby server")?;
        Ok(check(resp).await?.json().await?)
    }

    /// Report the player count of a lobby
    pub async fn update(&self, host: &str, port: u16, num_players: u32) -> Result<()> {
        let body = UpdateLobbyRequest {
            host: host.to_string(),
            port,
            num_players,
        };
        let resp = self
            .http
            .put(self.url("/lobby"))
            .json(&body)
            .send()
            .await
            .context("Failed to reach lobby server")?;
        check(resp).await?;
        Ok(())
    }

    /// Mark the managed-host lobby on `port` for reaping
    pub async fn reap(&self, port: u16) -> Result<()> {
        let resp = self
            .http
            .get(self.url(&format!("/reap/{}", port)))
            .send()
            .await
            .context("Failed to reach lobby server")?;
        check(resp).await?;
        Ok(())
    }

    /// Returns true if the server answers its health probe
    pub async fn health(&self) -> Result<bool> {
        let resp = self.http.get(self.url("/health")).send().await?;
        Ok(resp.status() == StatusCode::OK)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn non-2xx responses into errors carrying the server's message
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => Err(anyhow!(
            "{} ({}): {}",
            body.error.code,
            status,
            body.error.message
        )),
        Err(_) => Err(anyhow!("Server returned {}: {}", status, text)),
    }
}
