// src/engine/mod.rs

//! Orchestration engine for cloudwork.
//!
//! This module ties together:
//! - the fan-out orchestrator, which runs one session per selected worker
//!   and joins them all
//! - the cancellation controller shared by every session
//! - per-host results and the end-of-run summary

pub mod cancel;
pub mod orchestrator;
pub mod summary;

pub use cancel::{
    spawn_interrupt_listener, CancelState, CancellationController, InterruptAction,
    Registration, TransportHandle,
};
pub use orchestrator::Orchestrator;
pub use summary::RunSummary;

/// Outcome of one session on one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub host: String,
    pub succeeded: bool,
    pub error_detail: Option<String>,
    /// The failure happened after cancellation was requested. Reported as
    /// an interruption rather than an error; `succeeded` is still `false`.
    pub interrupted: bool,
}

impl RunResult {
    pub fn success(host: &str) -> Self {
        Self {
            host: host.to_string(),
            succeeded: true,
            error_detail: None,
            interrupted: false,
        }
    }

    pub fn failure(host: &str, detail: impl Into<String>, interrupted: bool) -> Self {
        Self {
            host: host.to_string(),
            succeeded: false,
            error_detail: Some(detail.into()),
            interrupted,
        }
    }
}
