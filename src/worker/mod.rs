//! Worker processes - launching game servers and terminating them

mod launcher;

pub use launcher::CommandLauncher;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while starting or stopping a worker process
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to launch '{binary}': {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open worker log {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker on port {port} exited before reporting a pid")]
    NoPid { port: u16 },

    #[error("Failed to kill process {pid}: {source}")]
    Kill {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Process {0} was not launched by this service")]
    UnknownPid(u32),

    #[error("Process {pid} already exited ({status})")]
    Exited { pid: u32, status: String },

    #[error("{operation} did not finish within {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u128,
    },
}

/// Starts and stops game server processes for the registry.
///
/// Implementations must not terminate the calling process on failure.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    /// Launch a worker bound to `port` and return its OS pid
    async fn spawn(&self, port: u16) -> Result<u32, ProcessError>;

    /// Forcibly terminate a worker this launcher started.
    ///
    /// A worker that has already exited is reported as an error.
    async fn kill(&self, pid: u32) -> Result<(), ProcessError>;
}

/// Name of the log artifact for the worker on `port`
pub fn log_file_name(port: u16) -> String {
    format!("log_{}.out", port)
}
