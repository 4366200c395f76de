//! Lobby management - records, endpoint identity, registry and reaping

mod reaper;
mod registry;

pub use reaper::{Reaper, SweepReport};
pub use registry::{LobbyRegistry, RegistryError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A game session advertised to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lobby {
    /// Display name chosen by the creator (not unique)
    pub name: String,

    /// Capacity assigned by the registry
    pub max_players: u32,

    /// Occupancy as last reported by the worker
    pub num_players: u32,

    /// Host the worker listens on
    pub host: String,

    /// Port the worker listens on
    pub port: u16,
}

impl Lobby {
    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(&self.host, self.port)
    }
}

/// Identity of a registry entry, derived from `(host, port)`.
///
/// Renders as `{host}_{port}` with the port in decimal. Hosts may contain
/// `_`; parsing splits on the last one, so every key round-trips.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
    host: String,
    port: u16,
}

impl EndpointKey {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.host, self.port)
    }
}

/// Error parsing an [`EndpointKey`] from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid endpoint key '{0}'")]
pub struct ParseKeyError(String);

impl FromStr for EndpointKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once('_')
            .ok_or_else(|| ParseKeyError(s.to_string()))?;
        let port = port.parse().map_err(|_| ParseKeyError(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

/// Internal bookkeeping kept next to every lobby. Never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStatus {
    /// Set the first time players are seen; never cleared
    pub players_joined: bool,

    /// Worker pid, `None` for seeded lobbies with no process behind them
    pub pid: Option<u32>,

    /// When the worker was spawned
    pub spawned_at: Option<DateTime<Utc>>,
}

impl ProcessStatus {
    fn spawned(pid: u32) -> Self {
        Self {
            players_joined: false,
            pid: Some(pid),
            spawned_at: Some(Utc::now()),
        }
    }

    fn seeded() -> Self {
        Self {
            players_joined: false,
            pid: None,
            spawned_at: None,
        }
    }

    /// How long the worker has been running, `None` for seeded lobbies
    pub fn uptime(&self) -> Option<chrono::Duration> {
        self.spawned_at.map(|at| Utc::now() - at)
    }
}

/// A lobby together with its process status; the two live and die together
#[derive(Debug, Clone)]
struct Entry {
    lobby: Lobby,
    status: ProcessStatus,
}

impl Entry {
    fn set_num_players(&mut self, num_players: u32) {
        self.lobby.num_players = num_players;
        if num_players > 0 {
            self.status.players_joined = true;
        }
    }

    /// Mark as used and empty so the next sweep reclaims it
    fn arm_for_reap(&mut self) {
        self.lobby.num_players = 0;
        self.status.players_joined = true;
    }

    /// Pid to kill if this entry is idle on the managed host
    fn reapable_pid(&self, managed_host: &str) -> Option<u32> {
        let idle = self.lobby.host == managed_host
            && self.lobby.num_players == 0
            && self.status.players_joined;
        if idle {
            self.status.pid
        } else {
            None
        }
    }

    /// Whole seconds the worker has been up, for log lines
    fn uptime_secs(&self) -> i64 {
        self.status.uptime().map_or(0, |uptime| uptime.num_seconds())
    }
}
