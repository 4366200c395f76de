//! lobbyctl - command-line client for a running lobby-balancer

use anyhow::Result;
use clap::{Parser, Subcommand};
use lobby_balancer::client::LobbyClient;

#[derive(Parser)]
#[command(name = "lobbyctl")]
#[command(about = "Inspect and manage lobbies on a lobby-balancer server")]
#[command(version)]
struct Cli {
    /// Base URL of the lobby server
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List lobbies
    List,
    /// Spawn a new lobby
    Create {
        /// Lobby name
        name: String,
    },
    /// Report the player count of a lobby
    Update {
        host: String,
        port: u16,
        num_players: u32,
    },
    /// Mark a managed-host lobby for reaping
    Reap {
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let client = LobbyClient::new(cli.server);

    match cli.command {
        Commands::List => {
            let lobbies = client.list().await?;
            if lobbies.is_empty() {
                println!("No lobbies");
            }
            for lobby in lobbies {
                println!(
                    "{:<24} {}:{:<6} {}/{}",
                    lobby.name, lobby.host, lobby.port, lobby.num_players, lobby.max_players
                );
            }
        }
        Commands::Create { name } => {
            let lobby = client.create(&name).await?;
            println!("Created '{}' on {}:{}", lobby.name, lobby.host, lobby.port);
        }
        Commands::Update {
            host,
            port,
            num_players,
        } => {
            client.update(&host, port, num_players).await?;
            println!("Updated {}:{} to {} players", host, port, num_players);
        }
        Commands::Reap { port } => {
            client.reap(port).await?;
            println!("Lobby on port {} marked for reaping", port);
        }
    }

    Ok(())
}
