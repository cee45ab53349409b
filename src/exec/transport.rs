// src/exec/transport.rs

//! Pluggable transport abstraction.
//!
//! Sessions never talk to the network themselves. They ask a [`Transport`]
//! for the external command that moves files or runs the payload script,
//! and the process runner spawns it.
//!
//! - [`ExternalTransport`] is the production implementation: `rsync` for
//!   file synchronization, `ssh` for the remote shell (both configurable).
//! - Tests provide their own `Transport` that maps hosts to local
//!   directories, so sessions run end-to-end without a network.

use std::fmt;
use std::path::PathBuf;

use tokio::process::Command;

use crate::config::TransportConfig;

/// Which way a sync request moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local to remote.
    Upload,
    /// Remote to local.
    Download,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Upload => f.write_str("upload"),
            SyncDirection::Download => f.write_str("download"),
        }
    }
}

/// One file-synchronization call, with both endpoints resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub direction: SyncDirection,
    pub local: PathBuf,
    pub remote: String,
}

impl SyncRequest {
    pub fn upload(local: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            direction: SyncDirection::Upload,
            local: local.into(),
            remote: remote.into(),
        }
    }

    pub fn download(remote: impl Into<String>, local: impl Into<PathBuf>) -> Self {
        Self {
            direction: SyncDirection::Download,
            local: local.into(),
            remote: remote.into(),
        }
    }

    /// `(from, to)` as written on a command line, remote side as `host:path`.
    pub fn endpoints(&self, host: &str) -> (String, String) {
        let local = self.local.display().to_string();
        let remote = format!("{host}:{}", self.remote);
        match self.direction {
            SyncDirection::Upload => (local, remote),
            SyncDirection::Download => (remote, local),
        }
    }
}

/// Trait abstracting how transfers and remote execution are performed.
///
/// Implementations only *build* commands; spawning, stdio wiring, output
/// streaming and cancellation are handled by [`run_transport`](super::run_transport).
pub trait Transport: Send + Sync + fmt::Debug {
    /// Command that performs `request` against `host`.
    fn sync_command(&self, host: &str, request: &SyncRequest) -> Command;

    /// Command that runs the script at [`remote_script_path`](Self::remote_script_path)
    /// on `host` under a login shell.
    fn shell_command(&self, host: &str) -> Command;

    /// Fixed remote location the payload script is uploaded to.
    fn remote_script_path(&self) -> &str;
}

/// Production transport built from the `[transport]` config section.
#[derive(Debug, Clone)]
pub struct ExternalTransport {
    config: TransportConfig,
}

impl ExternalTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// The command string handed to the remote shell.
    pub fn remote_command(&self) -> String {
        format!(
            "{} 'sh {}'",
            self.config.login_command, self.config.remote_script_path
        )
    }
}

impl Transport for ExternalTransport {
    fn sync_command(&self, host: &str, request: &SyncRequest) -> Command {
        let (from, to) = request.endpoints(host);
        let mut cmd = Command::new(&self.config.sync);
        cmd.args(&self.config.sync_args).arg(from).arg(to);
        cmd
    }

    fn shell_command(&self, host: &str) -> Command {
        let mut cmd = Command::new(&self.config.shell);
        cmd.arg(host)
            .args(&self.config.shell_args)
            .arg(self.remote_command());
        cmd
    }

    fn remote_script_path(&self) -> &str {
        &self.config.remote_script_path
    }
}
