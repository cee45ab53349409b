// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Per-host failures (`Transfer`, `RemoteExecution`, `Interrupted`) are
//! captured into a [`RunResult`](crate::engine::RunResult) by the session
//! runner and never unwind into sibling sessions. Only configuration errors
//! abort a run before it starts.

use thiserror::Error;

use crate::exec::SyncDirection;

#[derive(Error, Debug)]
pub enum CloudworkError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unknown script: {0}")]
    UnknownScript(String),

    #[error("Unknown host: {0}")]
    UnknownHost(String),

    #[error("failed to spawn {program} for {host}: {source}")]
    Spawn {
        host: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{direction} {from} -> {to} failed on {host} ({status})")]
    Transfer {
        host: String,
        direction: SyncDirection,
        from: String,
        to: String,
        status: String,
    },

    #[error("remote script failed on {host} ({status})")]
    RemoteExecution { host: String, status: String },

    #[error("session on {host} interrupted")]
    Interrupted { host: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CloudworkError {
    /// True for failures caused by a requested shutdown rather than by the
    /// host itself.
    pub fn is_interruption(&self) -> bool {
        matches!(self, CloudworkError::Interrupted { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CloudworkError>;
