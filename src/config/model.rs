use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::script::Operation;
use crate::types::FailurePolicy;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// remote_input_dir = "/data/input"
/// failure_policy = "continue"
///
/// [[workers]]
/// host = "gpu-1"
///
/// [[workers]]
/// host = "gpu-2"
///
/// [scripts]
/// setup = """
/// upload ./requirements.txt /opt/job/requirements.txt
/// pip install -r /opt/job/requirements.txt
/// """
/// run = """
/// upload-input
/// python /opt/job/train.py
/// download-output
/// """
/// ```
///
/// Use `ConfigFile::try_from` (or [`load_and_validate`](super::load_and_validate))
/// to obtain a checked [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub workers: Vec<Worker>,

    /// Named operation scripts from `[scripts]`.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    /// Shorthand for `scripts.setup`.
    #[serde(default)]
    pub setup: Option<String>,

    /// Shorthand for `scripts.run`.
    #[serde(default)]
    pub run: Option<String>,

    #[serde(default = "default_remote_input_dir", alias = "remoteInputDir")]
    pub remote_input_dir: String,

    #[serde(default = "default_remote_output_dir", alias = "remoteOutputDir")]
    pub remote_output_dir: String,

    /// Local root of the per-host `input/` and `output/` directories.
    #[serde(default = "default_work_root")]
    pub work_root: PathBuf,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub transport: TransportConfig,
}

/// One remote host under management.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Worker {
    pub host: String,
}

impl Worker {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

/// `[transport]` section: which external programs move files and run
/// scripts, and how they are invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Remote-shell program.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Extra arguments placed after the host on the remote-shell command line.
    #[serde(default = "default_shell_args")]
    pub shell_args: Vec<String>,

    /// File-synchronization program.
    #[serde(default = "default_sync")]
    pub sync: String,

    /// Arguments placed before source and destination on every sync call.
    #[serde(default = "default_sync_args")]
    pub sync_args: Vec<String>,

    /// Login-shell prefix used to run the payload script on the remote host.
    #[serde(default = "default_login_command")]
    pub login_command: String,

    /// Where the preprocessed payload is placed on each host.
    #[serde(default = "default_remote_script_path")]
    pub remote_script_path: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            shell_args: default_shell_args(),
            sync: default_sync(),
            sync_args: default_sync_args(),
            login_command: default_login_command(),
            remote_script_path: default_remote_script_path(),
        }
    }
}

fn default_remote_input_dir() -> String {
    "/tmp/worker/input".to_string()
}

fn default_remote_output_dir() -> String {
    "/tmp/worker/output".to_string()
}

fn default_work_root() -> PathBuf {
    PathBuf::from("workers")
}

fn default_shell() -> String {
    "ssh".to_string()
}

fn default_shell_args() -> Vec<String> {
    vec!["-t".to_string()]
}

fn default_sync() -> String {
    "rsync".to_string()
}

fn default_sync_args() -> Vec<String> {
    vec!["-r".to_string(), "--mkpath".to_string()]
}

fn default_login_command() -> String {
    "bash --login -c".to_string()
}

fn default_remote_script_path() -> String {
    "/tmp/cloudwork-exec.sh".to_string()
}

/// Validated configuration.
///
/// Guarantees (checked in `validate.rs`):
/// - at least one worker
/// - every host is non-empty, free of whitespace, and unique
/// - `setup` / `run` shorthands are merged into `scripts`
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub workers: Vec<Worker>,
    pub scripts: BTreeMap<String, String>,
    pub remote_input_dir: String,
    pub remote_output_dir: String,
    pub work_root: PathBuf,
    pub failure_policy: FailurePolicy,
    pub transport: TransportConfig,
}

impl ConfigFile {
    /// Build from already-validated parts. Only `validate.rs` should call this.
    pub(crate) fn new_unchecked(raw: RawConfigFile, scripts: BTreeMap<String, String>) -> Self {
        Self {
            workers: raw.workers,
            scripts,
            remote_input_dir: raw.remote_input_dir,
            remote_output_dir: raw.remote_output_dir,
            work_root: raw.work_root,
            failure_policy: raw.failure_policy,
            transport: raw.transport,
        }
    }

    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    pub fn has_host(&self, host: &str) -> bool {
        self.workers.iter().any(|w| w.host == host)
    }

    /// Bind a script body to this config's remote directory defaults.
    pub fn operation(&self, name: impl Into<String>, script: impl Into<String>) -> Operation {
        Operation {
            name: name.into(),
            script: script.into(),
            remote_input_dir: self.remote_input_dir.clone(),
            remote_output_dir: self.remote_output_dir.clone(),
        }
    }
}
