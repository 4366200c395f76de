//! Launch game servers as child processes

use super::{log_file_name, ProcessError, WorkerLauncher};
use crate::config::WorkerConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// Launches the configured game server binary in headless mode
pub struct CommandLauncher {
    /// Executable to run
    binary: PathBuf,

    /// Argument template with `{port}` / `{logfile}` placeholders
    args: Vec<String>,

    /// Where `log_{port}.out` files are written
    log_dir: PathBuf,

    /// Handles of launched workers by pid. Signals only go through these,
    /// never to a bare pid the OS may have handed to someone else.
    children: Mutex<HashMap<u32, Child>>,
}

impl CommandLauncher {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            args: config.args.clone(),
            log_dir: config.log_dir.clone(),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Path of the log file a worker on `port` writes to
    pub fn log_path(&self, port: u16) -> PathBuf {
        self.log_dir.join(log_file_name(port))
    }

    fn render_args(&self, port: u16, log_path: &Path) -> Vec<String> {
        let port = port.to_string();
        let logfile = log_path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{port}", &port).replace("{logfile}", &logfile))
            .collect()
    }
}

#[async_trait]
impl WorkerLauncher for CommandLauncher {
    async fn spawn(&self, port: u16) -> Result<u32, ProcessError> {
        let log_path = self.log_path(port);
        let args = self.render_args(port, &log_path);

        tracing::info!(
            "Spawning worker on port {} with '{}' (log: {})",
            port,
            self.binary.display(),
            log_path.display()
        );

        // Append so a worker that also honours `-logfile` can share the file.
        let log_err = |source: std::io::Error| ProcessError::LogFile {
            path: log_path.clone(),
            source,
        };
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(log_err)?;
        let stderr = stdout.try_clone().map_err(log_err)?;

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|source| ProcessError::Launch {
                binary: self.binary.display().to_string(),
                source,
            })?;

        let pid = child.id().ok_or(ProcessError::NoPid { port })?;

        self.children.lock().await.insert(pid, child);

        tracing::info!("Worker {} started on port {}", pid, port);
        Ok(pid)
    }

    async fn kill(&self, pid: u32) -> Result<(), ProcessError> {
        let mut children = self.children.lock().await;
        let child = children.get_mut(&pid).ok_or(ProcessError::UnknownPid(pid))?;

        let kill_err = |source: std::io::Error| ProcessError::Kill { pid, source };

        // A worker that already exited is reported, not signalled.
        if let Some(status) = child.try_wait().map_err(kill_err)? {
            children.remove(&pid);
            tracing::info!("Worker {} had already exited: {}", pid, status);
            return Err(ProcessError::Exited {
                pid,
                status: status.to_string(),
            });
        }

        child.start_kill().map_err(kill_err)?;
        let status = child.wait().await.map_err(kill_err)?;
        children.remove(&pid);

        tracing::info!("Worker {} killed: {}", pid, status);
        Ok(())
    }
}
