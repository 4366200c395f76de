//! Idle reaper - periodically kills workers whose lobbies emptied out

use super::{EndpointKey, LobbyRegistry};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Outcome of a single sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries whose worker was killed and which were removed
    pub reaped: Vec<EndpointKey>,

    /// Entries whose worker could not be killed; kept for the next sweep
    pub failed: Vec<EndpointKey>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.reaped.is_empty() && self.failed.is_empty()
    }
}

/// Background task reclaiming used-and-now-empty lobbies
pub struct Reaper {
    registry: LobbyRegistry,
    interval: Duration,
}

impl Reaper {
    pub fn new(registry: LobbyRegistry, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Sweep every interval until a shutdown signal arrives or the sender is dropped.
    ///
    /// The first sweep happens one full interval after start.
    pub async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Reaper started, sweeping every {:?}", self.interval);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Reaper shutting down");
                    break;
                }

                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    /// Run one pass under the registry write lock.
    ///
    /// Entries on the managed host that are empty, have had players, and are
    /// backed by a process get their worker killed and are removed. A failed
    /// kill leaves the entry in place to be retried next pass.
    pub async fn sweep(&self) -> SweepReport {
        let managed_host = self.registry.managed_host();
        let mut report = SweepReport::default();

        let mut state = self.registry.state.write().await;

        let candidates: Vec<(EndpointKey, u32, i64)> = state
            .entries
            .iter()
            .filter_map(|(key, entry)| {
                entry
                    .reapable_pid(managed_host)
                    .map(|pid| (key.clone(), pid, entry.uptime_secs()))
            })
            .collect();

        for (key, pid, uptime_secs) in candidates {
            tracing::info!("Trying to reap process {} for lobby {}", pid, key);
            match self.registry.kill_worker(pid).await {
                Ok(()) => {
                    state.entries.remove(&key);
                    tracing::info!(
                        "Reaped process {} for lobby {} after {}s",
                        pid,
                        key,
                        uptime_secs
                    );
                    report.reaped.push(key);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to reap process {} for lobby {} (up {}s): {}",
                        pid,
                        key,
                        uptime_secs,
                        e
                    );
                    report.failed.push(key);
                }
            }
        }

        tracing::debug!(
            "Sweep finished: {} reaped, {} failed, {} remaining",
            report.reaped.len(),
            report.failed.len(),
            state.entries.len()
        );
        report
    }
}
