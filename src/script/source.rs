// src/script/source.rs

use std::path::PathBuf;

use crate::config::ConfigFile;
use crate::errors::{CloudworkError, Result};
use crate::fs::FileSystem;
use crate::script::Operation;

/// Where the script for an operation comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// A script from the config's `[scripts]` table.
    Named(String),
    /// A local file, read at resolve time.
    File(PathBuf),
    /// Script text given directly (the `exec` command).
    Inline(String),
}

impl ScriptSource {
    /// Interpret the argument of `cloudwork run`: anything starting with
    /// `./` or `/` is a file path, everything else a script name.
    pub fn from_run_arg(arg: &str) -> Self {
        if arg.starts_with("./") || arg.starts_with('/') {
            ScriptSource::File(PathBuf::from(arg))
        } else {
            ScriptSource::Named(arg.to_string())
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ScriptSource::File(_))
    }

    /// Load the script text and bind it to the config's remote directories.
    pub fn resolve(&self, cfg: &ConfigFile, fs: &dyn FileSystem) -> Result<Operation> {
        match self {
            ScriptSource::Named(name) => {
                let script = cfg
                    .script(name)
                    .ok_or_else(|| CloudworkError::UnknownScript(name.clone()))?;
                Ok(cfg.operation(name.clone(), script))
            }
            ScriptSource::File(path) => {
                if !fs.is_file(path) {
                    return Err(CloudworkError::UnknownScript(format!(
                        "script file not found: {}",
                        path.display()
                    )));
                }
                let script = fs.read_to_string(path)?;
                Ok(cfg.operation(path.display().to_string(), script))
            }
            ScriptSource::Inline(script) => Ok(cfg.operation("exec", script.clone())),
        }
    }
}
