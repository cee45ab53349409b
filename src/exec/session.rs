// src/exec/session.rs

//! Runs one operation on one worker.
//!
//! Steps, strictly sequential within a session:
//!
//! 1. preprocess the script into payload + directives
//! 2. run immediate directives (any failure ends the session here)
//! 3. upload the payload to the transport's fixed remote script path
//! 4. run it through the remote shell, streaming output to the sink
//! 5. run deferred directives whatever step 3/4 returned, unless
//!    cancellation was requested
//!
//! The outcome is folded into a [`RunResult`]; errors never escape.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::config::Worker;
use crate::engine::{CancellationController, RunResult};
use crate::errors::{CloudworkError, Result};
use crate::exec::output::LogSink;
use crate::exec::process::run_transport;
use crate::exec::transport::{SyncDirection, SyncRequest, Transport};
use crate::layout::WorkerLayout;
use crate::script::{preprocess, Directive, Operation, Preprocessed, Transfer};

/// Everything a session needs besides the worker and the operation.
///
/// Cheap to clone; the orchestrator hands one clone to every session task.
#[derive(Clone)]
pub struct SessionRunner {
    transport: Arc<dyn Transport>,
    controller: Arc<CancellationController>,
    sink: Arc<dyn LogSink>,
    layout: WorkerLayout,
}

impl std::fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRunner")
            .field("transport", &self.transport)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl SessionRunner {
    pub fn new(
        transport: Arc<dyn Transport>,
        controller: Arc<CancellationController>,
        sink: Arc<dyn LogSink>,
        layout: WorkerLayout,
    ) -> Self {
        Self {
            transport,
            controller,
            sink,
            layout,
        }
    }

    pub fn controller(&self) -> &Arc<CancellationController> {
        &self.controller
    }

    /// Execute `op` on `worker`.
    ///
    /// `silent` suppresses transfer narration only; failures are always
    /// returned in the result.
    pub async fn run_session(&self, worker: &Worker, op: &Operation, silent: bool) -> RunResult {
        let session = Session {
            runner: self,
            host: &worker.host,
            op,
            silent,
        };

        match session.execute().await {
            Ok(()) => RunResult::success(&worker.host),
            Err(err) => {
                let interrupted = err.is_interruption() || self.controller.is_cancelled();
                RunResult::failure(&worker.host, err.to_string(), interrupted)
            }
        }
    }
}

/// Runtime state of one operation on one worker. Lives for the duration of
/// [`SessionRunner::run_session`].
struct Session<'a> {
    runner: &'a SessionRunner,
    host: &'a str,
    op: &'a Operation,
    silent: bool,
}

impl Session<'_> {
    async fn execute(&self) -> Result<()> {
        let pre = preprocess(&self.op.script);
        for warning in &pre.warnings {
            warn!(
                host = %self.host,
                operation = %self.op.name,
                "ignoring malformed directive: {warning}"
            );
        }

        for directive in pre.immediate() {
            self.transfer(directive).await?;
        }

        let main = self.run_payload(&pre.payload).await;
        let deferred = self.run_deferred(&pre, main.is_ok()).await;

        main.and(deferred)
    }

    /// Ship the payload and run it through the remote shell.
    async fn run_payload(&self, payload: &str) -> Result<()> {
        let transport = &self.runner.transport;

        let mut script = tempfile::Builder::new()
            .prefix("cloudwork_")
            .suffix(".sh")
            .tempfile()
            .context("creating payload file")?;
        script
            .write_all(payload.as_bytes())
            .and_then(|()| script.flush())
            .context("writing payload file")?;

        debug!(host = %self.host, bytes = payload.len(), "uploading payload script");
        let request = SyncRequest::upload(script.path(), transport.remote_script_path());
        self.sync(&request).await?;
        // The local copy is only needed until it has been transferred.
        drop(script);

        let status = run_transport(
            self.host,
            transport.shell_command(self.host),
            &self.runner.controller,
            self.runner.sink.as_ref(),
        )
        .await?;

        if !status.success() {
            return Err(self.interrupted_or(CloudworkError::RemoteExecution {
                host: self.host.to_string(),
                status: status.to_string(),
            }));
        }
        Ok(())
    }

    /// Run every deferred directive in order, best effort.
    ///
    /// Skipped entirely once cancellation was requested. A failing download
    /// does not stop the following ones; the first error is returned.
    async fn run_deferred(&self, pre: &Preprocessed, main_succeeded: bool) -> Result<()> {
        let deferred: Vec<&Directive> = pre.deferred().collect();
        if deferred.is_empty() {
            return Ok(());
        }

        if self.runner.controller.is_cancelled() {
            info!(
                host = %self.host,
                skipped = deferred.len(),
                "cancellation requested; skipping deferred directives"
            );
            return Err(CloudworkError::Interrupted {
                host: self.host.to_string(),
            });
        }

        if !main_succeeded {
            debug!(host = %self.host, "running deferred directives after failed payload");
        }

        let mut first_err = None;
        for directive in deferred {
            if let Err(err) = self.transfer(directive).await {
                if !err.is_interruption() {
                    error!(host = %self.host, directive = %directive, error = %err, "deferred transfer failed");
                }
                first_err.get_or_insert(err);
            }
        }

        first_err.map_or(Ok(()), Err)
    }

    async fn transfer(&self, directive: &Directive) -> Result<()> {
        let request = self.resolve(directive);
        if !self.silent {
            let (from, to) = request.endpoints(self.host);
            let verb = match request.direction {
                SyncDirection::Upload => "uploading",
                SyncDirection::Download => "downloading",
            };
            info!(host = %self.host, "{verb} {from} to {to}");
        }
        self.sync(&request).await
    }

    async fn sync(&self, request: &SyncRequest) -> Result<()> {
        let cmd = self.runner.transport.sync_command(self.host, request);
        let status = run_transport(
            self.host,
            cmd,
            &self.runner.controller,
            self.runner.sink.as_ref(),
        )
        .await?;

        if !status.success() {
            let (from, to) = request.endpoints(self.host);
            return Err(self.interrupted_or(CloudworkError::Transfer {
                host: self.host.to_string(),
                direction: request.direction,
                from,
                to,
                status: status.to_string(),
            }));
        }
        Ok(())
    }

    /// Map a directive to concrete endpoints for this host.
    fn resolve(&self, directive: &Directive) -> SyncRequest {
        let layout = &self.runner.layout;
        match &directive.transfer {
            Transfer::Upload { local, remote } => {
                SyncRequest::upload(PathBuf::from(local), remote.clone())
            }
            Transfer::Download { remote, local } => {
                SyncRequest::download(remote.clone(), PathBuf::from(local))
            }
            Transfer::UploadInput { remote } => SyncRequest::upload(
                layout.input_dir(self.host),
                remote.clone().unwrap_or_else(|| self.op.remote_input_dir.clone()),
            ),
            Transfer::DownloadOutput { remote } => SyncRequest::download(
                remote.clone().unwrap_or_else(|| self.op.remote_output_dir.clone()),
                layout.output_dir(self.host),
            ),
        }
    }

    /// A transport that died because we asked it to is an interruption,
    /// not a host failure.
    fn interrupted_or(&self, err: CloudworkError) -> CloudworkError {
        if self.runner.controller.is_cancelled() {
            debug!(host = %self.host, error = %err, "failure after cancellation");
            CloudworkError::Interrupted {
                host: self.host.to_string(),
            }
        } else {
            err
        }
    }
}
