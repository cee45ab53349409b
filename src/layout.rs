// src/layout.rs

//! Local per-host directory layout.
//!
//! ```text
//! <root>/<host>/input/    uploaded by `upload-input`
//! <root>/<host>/output/   filled by `download-output`
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Worker;
use crate::fs::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerLayout {
    root: PathBuf,
}

impl WorkerLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn host_dir(&self, host: &str) -> PathBuf {
        self.root.join(host)
    }

    /// Keeps a trailing separator so the sync transport copies the
    /// directory's contents rather than the directory itself.
    pub fn input_dir(&self, host: &str) -> PathBuf {
        self.host_dir(host).join("input/")
    }

    pub fn output_dir(&self, host: &str) -> PathBuf {
        self.host_dir(host).join("output/")
    }
}

/// Create `input/` and `output/` for every worker. Existing directories
/// are left alone.
pub fn bootstrap(fs: &dyn FileSystem, layout: &WorkerLayout, workers: &[Worker]) -> Result<()> {
    info!(root = %layout.root().display(), "bootstrapping worker directories");
    for worker in workers {
        let dirs = [layout.input_dir(&worker.host), layout.output_dir(&worker.host)];
        if dirs.iter().all(|d| fs.is_dir(d)) {
            debug!(host = %worker.host, "worker directories already present");
            continue;
        }
        for dir in &dirs {
            fs.create_dir_all(dir)?;
        }
        info!(host = %worker.host, "created directories for worker");
    }
    Ok(())
}
