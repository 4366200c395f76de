//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Seed lobby {host}:{port} is listed more than once")]
    DuplicateSeed { host: String, port: u16 },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub worker: WorkerConfig,
    pub seed_lobbies: Vec<SeedLobby>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            registry: RegistryConfig::default(),
            worker: WorkerConfig::default(),
            seed_lobbies: vec![SeedLobby {
                name: "localhost lobby".to_string(),
                host: "localhost".to_string(),
                port: 8888,
                max_players: None,
            }],
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address the lobby API binds to
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Registry, port allocation and reaping policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// The only host this control plane spawns and reaps workers on
    pub managed_host: String,

    /// First port handed out to a spawned worker
    pub base_port: u16,

    /// How many candidate ports the allocator tries before giving up
    pub max_port_attempts: u32,

    /// Capacity assigned to every lobby the registry creates
    pub max_players: u32,

    /// Seconds between idle reaper sweeps
    pub reap_interval_seconds: u64,

    /// Upper bound on a single spawn or kill call
    pub process_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            managed_host: "pylon1.usc.edu".to_string(),
            base_port: 9000,
            max_port_attempts: 1000,
            max_players: 8,
            reap_interval_seconds: 10,
            process_timeout_ms: 5000,
        }
    }
}

impl RegistryConfig {
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_seconds)
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_millis(self.process_timeout_ms)
    }
}

/// How game server workers are launched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerConfig {
    /// Path to the game server executable
    pub binary: PathBuf,

    /// Argument template; `{port}` and `{logfile}` are substituted per worker
    pub args: Vec<String>,

    /// Directory that receives `log_{port}.out` files
    pub log_dir: PathBuf,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/home/gpstudent/game/Linux.x86_64"),
            args: [
                "-batchmode",
                "-nographics",
                "-server",
                "-port={port}",
                "-logfile",
                "{logfile}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            log_dir: PathBuf::from("."),
        }
    }
}

/// A statically configured lobby with no process behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedLobby {
    pub name: String,
    pub host: String,
    pub port: u16,

    /// Falls back to the registry capacity policy when unset
    #[serde(default)]
    pub max_players: Option<u32>,
}

impl Config {
    /// Load config from the default location, or return defaults if not found
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load and validate config from an explicit file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lobby-balancer")
            .join("config.toml")
    }

    /// Reject settings the registry cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let registry = &self.registry;

        if registry.managed_host.trim().is_empty() {
            return Err(invalid("registry.managedHost", "must not be empty"));
        }
        if registry.reap_interval_seconds == 0 {
            return Err(invalid("registry.reapIntervalSeconds", "must be positive"));
        }
        if registry.max_port_attempts == 0 {
            return Err(invalid("registry.maxPortAttempts", "must be positive"));
        }
        if registry.max_players == 0 {
            return Err(invalid("registry.maxPlayers", "must be positive"));
        }
        if registry.process_timeout_ms == 0 {
            return Err(invalid("registry.processTimeoutMs", "must be positive"));
        }
        if self.worker.binary.as_os_str().is_empty() {
            return Err(invalid("worker.binary", "must not be empty"));
        }

        let mut seen = HashSet::new();
        for seed in &self.seed_lobbies {
            if !seen.insert((seed.host.as_str(), seed.port)) {
                return Err(ConfigError::DuplicateSeed {
                    host: seed.host.clone(),
                    port: seed.port,
                });
            }
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
