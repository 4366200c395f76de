//! Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use lobby_balancer::config::{RegistryConfig, SeedLobby};
use lobby_balancer::lobby::LobbyRegistry;
use lobby_balancer::worker::{ProcessError, WorkerLauncher};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MANAGED_HOST: &str = "pylon1.usc.edu";

/// Launcher that records calls instead of starting processes
#[derive(Default)]
pub struct FakeLauncher {
    next_pid: AtomicU32,
    fail_spawn: AtomicBool,
    fail_kill: AtomicBool,
    spawn_delay: Mutex<Option<Duration>>,
    spawned: Mutex<Vec<u16>>,
    killed: Mutex<Vec<u32>>,
}

impl FakeLauncher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_pid: AtomicU32::new(1000),
            ..Default::default()
        })
    }

    pub fn fail_spawns(&self, fail: bool) {
        self.fail_spawn.store(fail, Ordering::SeqCst);
    }

    pub fn fail_kills(&self, fail: bool) {
        self.fail_kill.store(fail, Ordering::SeqCst);
    }

    pub fn delay_spawns(&self, delay: Duration) {
        *self.spawn_delay.lock().unwrap() = Some(delay);
    }

    pub fn spawned_ports(&self) -> Vec<u16> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn killed_pids(&self) -> Vec<u32> {
        self.killed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerLauncher for FakeLauncher {
    async fn spawn(&self, port: u16) -> Result<u32, ProcessError> {
        let delay = *self.spawn_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_spawn.load(Ordering::SeqCst) {
            return Err(ProcessError::Launch {
                binary: "/missing/game".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        self.spawned.lock().unwrap().push(port);
        Ok(self.next_pid.fetch_add(1, Ordering::SeqCst))
    }

    async fn kill(&self, pid: u32) -> Result<(), ProcessError> {
        if self.fail_kill.load(Ordering::SeqCst) {
            return Err(ProcessError::Kill {
                pid,
                source: std::io::Error::from_raw_os_error(3),
            });
        }
        self.killed.lock().unwrap().push(pid);
        Ok(())
    }
}

pub fn registry_config() -> RegistryConfig {
    RegistryConfig {
        managed_host: MANAGED_HOST.to_string(),
        base_port: 9000,
        max_port_attempts: 100,
        max_players: 8,
        reap_interval_seconds: 10,
        process_timeout_ms: 1000,
    }
}

pub fn new_registry() -> (LobbyRegistry, Arc<FakeLauncher>) {
    new_registry_with(registry_config())
}

pub fn new_registry_with(config: RegistryConfig) -> (LobbyRegistry, Arc<FakeLauncher>) {
    let launcher = FakeLauncher::new();
    let registry = LobbyRegistry::new(config, launcher.clone());
    (registry, launcher)
}

pub fn seed(name: &str, host: &str, port: u16) -> SeedLobby {
    SeedLobby {
        name: name.to_string(),
        host: host.to_string(),
        port,
        max_players: None,
    }
}
