//! Integration tests for the HTTP server

mod common;

use common::{new_registry_with, registry_config, seed, FakeLauncher, MANAGED_HOST};
use lobby_balancer::client::LobbyClient;
use lobby_balancer::config::RegistryConfig;
use lobby_balancer::lobby::{Lobby, LobbyRegistry, Reaper};
use lobby_balancer::protocol::ErrorBody;
use lobby_balancer::server::LobbyServer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

struct TestServer {
    client: LobbyClient,
    registry: LobbyRegistry,
    launcher: Arc<FakeLauncher>,
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(registry_config()).await
    }

    async fn start_with(config: RegistryConfig) -> Self {
        let (registry, launcher) = new_registry_with(config);
        registry
            .seed(vec![seed("localhost lobby", "localhost", 8888)])
            .await;

        let server = LobbyServer::bind("127.0.0.1:0", registry.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let handle = tokio::spawn(server.run(shutdown_rx));

        Self {
            client: LobbyClient::new(format!("http://{}", addr)),
            registry,
            launcher,
            shutdown_tx,
            handle,
        }
    }

    async fn stop(self) {
        let Self {
            client,
            shutdown_tx,
            handle,
            ..
        } = self;
        drop(client);
        let _ = shutdown_tx.send(()).await;
        let result = timeout(Duration::from_secs(2), handle).await;
        assert!(result.is_ok(), "server should shut down");
    }
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await;

    assert!(server.client.health().await.unwrap());

    server.stop().await;
}

#[tokio::test]
async fn test_list_returns_seeded_lobby() {
    let server = TestServer::start().await;

    let lobbies = server.client.list().await.unwrap();
    assert_eq!(
        lobbies,
        vec![Lobby {
            name: "localhost lobby".to_string(),
            max_players: 8,
            num_players: 0,
            host: "localhost".to_string(),
            port: 8888,
        }]
    );

    server.stop().await;
}

#[tokio::test]
async fn test_list_uses_camel_case_fields() {
    let server = TestServer::start().await;

    let url = format!("{}/lobby", server.client.base_url());
    let body: serde_json::Value = reqwest::get(url).await.unwrap().json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!([{
            "name": "localhost lobby",
            "maxPlayers": 8,
            "numPlayers": 0,
            "host": "localhost",
            "port": 8888
        }])
    );

    server.stop().await;
}

#[tokio::test]
async fn test_create_update_and_reap_flow() {
    let server = TestServer::start().await;

    let lobby = server.client.create("Arena").await.unwrap();
    assert_eq!(lobby.host, MANAGED_HOST);
    assert_eq!(lobby.port, 9000);
    assert_eq!(server.launcher.spawned_ports(), vec![9000]);

    server
        .client
        .update(MANAGED_HOST, lobby.port, 3)
        .await
        .unwrap();
    let lobbies = server.client.list().await.unwrap();
    assert_eq!(lobbies.len(), 2);
    assert!(lobbies.iter().any(|l| l.port == 9000 && l.num_players == 3));

    server.client.reap(lobby.port).await.unwrap();
    let status = server
        .registry
        .process_status(MANAGED_HOST, lobby.port)
        .await
        .unwrap();
    assert!(status.players_joined);

    let reaper = Reaper::new(server.registry.clone(), Duration::from_secs(10));
    assert_eq!(reaper.sweep().await.reaped.len(), 1);
    assert_eq!(server.client.list().await.unwrap().len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_create_returns_201_and_ignores_extra_fields() {
    let server = TestServer::start().await;

    let url = format!("{}/lobby", server.client.base_url());
    let resp = reqwest::Client::new()
        .post(url)
        .json(&serde_json::json!({
            "name": "Arena",
            "maxPlayers": 100,
            "numPlayers": 7,
            "host": "evil.example.org",
            "port": 1
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    let lobby: Lobby = resp.json().await.unwrap();
    assert_eq!(lobby.max_players, 8);
    assert_eq!(lobby.num_players, 0);
    assert_eq!(lobby.host, MANAGED_HOST);
    assert_eq!(lobby.port, 9000);

    server.stop().await;
}

#[tokio::test]
async fn test_update_unknown_lobby_is_404() {
    let server = TestServer::start().await;

    let url = format!("{}/lobby", server.client.base_url());
    let resp = reqwest::Client::new()
        .put(url)
        .json(&serde_json::json!({"host": "nosuch", "port": 1, "numPlayers": 5}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.error.code, "NOT_FOUND");

    let err = server.client.reap(1).await.unwrap_err();
    assert!(err.to_string().contains("NOT_FOUND"));

    server.stop().await;
}

#[tokio::test]
async fn test_spawn_failure_is_500() {
    let server = TestServer::start().await;
    server.launcher.fail_spawns(true);

    let err = server.client.create("Arena").await.unwrap_err();
    assert!(err.to_string().contains("SPAWN_FAILED"));
    assert_eq!(server.client.list().await.unwrap().len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_exhausted_port_range_is_503() {
    let server = TestServer::start_with(RegistryConfig {
        max_port_attempts: 1,
        ..registry_config()
    })
    .await;

    server.client.create("first").await.unwrap();

    let url = format!("{}/lobby", server.client.base_url());
    let resp = reqwest::Client::new()
        .post(url)
        .json(&serde_json::json!({"name": "second"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.error.code, "RESOURCE_EXHAUSTED");

    let err = server.client.create("third").await.unwrap_err();
    assert!(err.to_string().contains("RESOURCE_EXHAUSTED"));
    assert_eq!(server.launcher.spawned_ports(), vec![9000]);
    assert_eq!(server.client.list().await.unwrap().len(), 2);

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let server = TestServer::start().await;

    let url = format!("{}/lobby", server.client.base_url());
    let resp = reqwest::Client::new()
        .put(url)
        .header("content-type", "application/json")
        .body("{\"host\": \"localhost\"")
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
    assert_eq!(server.client.list().await.unwrap()[0].num_players, 0);

    server.stop().await;
}
