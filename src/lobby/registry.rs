//! Lobby registry - the single store of lobbies and their worker processes

use super::{EndpointKey, Entry, Lobby, ProcessStatus};
use crate::config::{RegistryConfig, SeedLobby};
use crate::worker::{ProcessError, WorkerLauncher};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors returned by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Lobby {key} not found")]
    NotFound { key: EndpointKey },

    #[error("Failed to spawn worker on port {port}: {source}")]
    SpawnFailed {
        port: u16,
        #[source]
        source: ProcessError,
    },

    #[error("No free port in {attempts} attempts starting at {base_port}")]
    ResourceExhausted { base_port: u16, attempts: u32 },
}

/// State guarded by the registry lock
pub(super) struct RegistryState {
    pub(super) entries: BTreeMap<EndpointKey, Entry>,
}

impl RegistryState {
    /// Lowest port at or above `base_port` with no entry on `host`
    fn next_free_port(
        &self,
        host: &str,
        base_port: u16,
        max_attempts: u32,
    ) -> Result<u16, RegistryError> {
        (0..max_attempts)
            .map_while(|offset| base_port.checked_add(u16::try_from(offset).ok()?))
            .find(|port| !self.entries.contains_key(&EndpointKey::new(host, *port)))
            .ok_or(RegistryError::ResourceExhausted {
                base_port,
                attempts: max_attempts,
            })
    }

    fn entry_mut(&mut self, host: &str, port: u16) -> Result<&mut Entry, RegistryError> {
        let key = EndpointKey::new(host, port);
        match self.entries.get_mut(&key) {
            Some(entry) => Ok(entry),
            None => Err(RegistryError::NotFound { key }),
        }
    }
}

/// Shared handle to the lobby store.
///
/// Cloning is cheap; every clone sees the same state. All operations take the
/// single reader/writer lock over the whole store, so a lobby and its process
/// status are always observed together.
#[derive(Clone)]
pub struct LobbyRegistry {
    pub(super) state: Arc<RwLock<RegistryState>>,
    launcher: Arc<dyn WorkerLauncher>,
    config: Arc<RegistryConfig>,
}

impl LobbyRegistry {
    /// Create an empty registry
    pub fn new(config: RegistryConfig, launcher: Arc<dyn WorkerLauncher>) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState {
                entries: BTreeMap::new(),
            })),
            launcher,
            config: Arc::new(config),
        }
    }

    /// The host this registry spawns and reaps workers on
    pub fn managed_host(&self) -> &str {
        &self.config.managed_host
    }

    /// Snapshot of all lobbies, ordered by endpoint key
    pub async fn list(&self) -> Vec<Lobby> {
        let state = self.state.read().await;
        state.entries.values().map(|e| e.lobby.clone()).collect()
    }

    /// Allocate a port, spawn a worker on it and register the new lobby.
    ///
    /// The write lock is held for the whole operation so two concurrent
    /// creations can never pick the same port. `requested_max_players` is
    /// ignored in favour of the configured capacity.
    pub async fn create(
        &self,
        name: impl Into<String>,
        requested_max_players: Option<u32>,
    ) -> Result<Lobby, RegistryError> {
        let name = name.into();
        let host = self.config.managed_host.clone();
        let max_players = self.config.max_players;

        if let Some(requested) = requested_max_players.filter(|r| *r != max_players) {
            tracing::debug!(
                "Ignoring requested capacity {} for '{}', using {}",
                requested,
                name,
                max_players
            );
        }

        let mut state = self.state.write().await;

        let port = state.next_free_port(
            &host,
            self.config.base_port,
            self.config.max_port_attempts,
        )?;

        let pid = self
            .bounded("spawn", self.launcher.spawn(port))
            .await
            .map_err(|source| {
                tracing::warn!("Failed to create lobby '{}': {}", name, source);
                RegistryError::SpawnFailed { port, source }
            })?;

        let lobby = Lobby {
            name,
            max_players,
            num_players: 0,
            host,
            port,
        };
        state.entries.insert(
            lobby.key(),
            Entry {
                lobby: lobby.clone(),
                status: ProcessStatus::spawned(pid),
            },
        );

        tracing::info!(
            "Created lobby '{}' on {}:{} (pid {})",
            lobby.name,
            lobby.host,
            lobby.port,
            pid
        );
        Ok(lobby)
    }

    /// Record the player count reported by a worker
    pub async fn update(
        &self,
        host: &str,
        port: u16,
        num_players: u32,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        let entry = state.entry_mut(host, port)?;

        tracing::debug!("Lobby {}:{} reports {} players", host, port, num_players);
        entry.set_num_players(num_players);
        Ok(())
    }

    /// Arm a lobby for reclamation by the next reaper sweep.
    ///
    /// This does not kill anything itself.
    pub async fn reap(&self, host: &str, port: u16) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        state.entry_mut(host, port)?.arm_for_reap();

        tracing::info!("Lobby {}:{} marked for reaping", host, port);
        Ok(())
    }

    /// Insert statically configured lobbies. Returns how many were added;
    /// endpoints already present are skipped.
    pub async fn seed(&self, seeds: impl IntoIterator<Item = SeedLobby>) -> usize {
        let mut state = self.state.write().await;
        let mut added = 0;

        for seed in seeds {
            let key = EndpointKey::new(&seed.host, seed.port);
            if state.entries.contains_key(&key) {
                tracing::warn!("Skipping duplicate seed lobby {}", key);
                continue;
            }

            let lobby = Lobby {
                name: seed.name,
                max_players: seed.max_players.unwrap_or(self.config.max_players),
                num_players: 0,
                host: seed.host,
                port: seed.port,
            };
            tracing::info!("Seeded lobby '{}' at {}", lobby.name, key);
            state.entries.insert(
                key,
                Entry {
                    lobby,
                    status: ProcessStatus::seeded(),
                },
            );
            added += 1;
        }

        added
    }

    /// Internal process bookkeeping for one lobby
    pub async fn process_status(&self, host: &str, port: u16) -> Option<ProcessStatus> {
        let state = self.state.read().await;
        state
            .entries
            .get(&EndpointKey::new(host, port))
            .map(|e| e.status.clone())
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Kill a worker, bounded by the configured process timeout
    pub(super) async fn kill_worker(&self, pid: u32) -> Result<(), ProcessError> {
        self.bounded("kill", self.launcher.kill(pid)).await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, ProcessError>>,
    ) -> Result<T, ProcessError> {
        let timeout = self.config.process_timeout();
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ProcessError::Timeout {
                operation,
                timeout_ms: timeout.as_millis(),
            }),
        }
    }
}
