//! lobby-balancer - lobby directory and game server process manager

use anyhow::{Context, Result};
use clap::Parser;
use lobby_balancer::{
    config::Config,
    lobby::{LobbyRegistry, Reaper},
    server::LobbyServer,
    worker::CommandLauncher,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "lobby-balancer")]
#[command(about = "Lobby directory that spawns and reaps game server processes")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Host this instance spawns workers on (overrides config)
    #[arg(long)]
    managed_host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    if let Some(host) = cli.managed_host {
        config.registry.managed_host = host;
    }
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "Managing workers on {} from port {}",
        config.registry.managed_host,
        config.registry.base_port
    );

    let launcher = Arc::new(CommandLauncher::new(&config.worker));
    let registry = LobbyRegistry::new(config.registry.clone(), launcher);
    registry.seed(config.seed_lobbies.clone()).await;

    let (reaper_tx, reaper_rx) = mpsc::channel::<()>(1);
    let reaper = Reaper::new(registry.clone(), config.registry.reap_interval());
    let reaper_handle = tokio::spawn(reaper.run(reaper_rx));

    let server = LobbyServer::bind(&config.server.listen_addr, registry).await?;
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Ctrl+C received");
        let _ = shutdown_tx.send(()).await;
    });

    let result = server.run(shutdown_rx).await;

    let _ = reaper_tx.send(()).await;
    let _ = reaper_handle.await;

    result
}
