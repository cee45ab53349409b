// src/engine/orchestrator.rs

use tracing::{error, info, warn};

use crate::config::Worker;
use crate::engine::{RunResult, RunSummary};
use crate::exec::SessionRunner;
use crate::script::Operation;
use crate::types::FailurePolicy;

/// Runs an operation on every selected worker at once and waits for all of
/// them.
///
/// - One Tokio task per worker; no limit on parallelism and no ordering
///   between hosts.
/// - A failing host is reported on its own and never blocks the others.
///   With [`FailurePolicy::FailFast`] the first real failure additionally
///   requests termination of every other session.
/// - Results come back in worker order, only for workers that ran.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    runner: SessionRunner,
    policy: FailurePolicy,
}

impl Orchestrator {
    pub fn new(runner: SessionRunner, policy: FailurePolicy) -> Self {
        Self { runner, policy }
    }

    /// Workers matching `host_filter` (exact match); all workers when the
    /// filter is `None` or empty.
    pub fn select<'w>(workers: &'w [Worker], host_filter: Option<&str>) -> Vec<&'w Worker> {
        match host_filter.filter(|h| !h.is_empty()) {
            Some(host) => workers.iter().filter(|w| w.host == host).collect(),
            None => workers.iter().collect(),
        }
    }

    pub async fn run_operation(
        &self,
        workers: &[Worker],
        host_filter: Option<&str>,
        op: &Operation,
        silent: bool,
    ) -> Vec<RunResult> {
        let selected = Self::select(workers, host_filter);

        let handles: Vec<_> = selected
            .into_iter()
            .map(|worker| {
                let worker = worker.clone();
                let host = worker.host.clone();
                let op = op.clone();
                let runner = self.runner.clone();
                let policy = self.policy;

                let handle = tokio::spawn(async move {
                    if !silent {
                        info!(host = %worker.host, operation = %op.name, "running script on worker");
                    }
                    let result = runner.run_session(&worker, &op, silent).await;
                    report(&runner, &result, silent);

                    if policy == FailurePolicy::FailFast
                        && !result.succeeded
                        && !result.interrupted
                        && runner.controller().request_termination()
                    {
                        warn!(host = %result.host, "fail-fast: stopping remaining workers");
                    }
                    result
                });
                (host, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (host, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!(host = %host, error = %e, "session task aborted");
                    RunResult::failure(&host, format!("session task aborted: {e}"), false)
                }
            };
            results.push(result);
        }

        let summary = RunSummary::from_results(&results);
        if !silent {
            info!(
                operation = %op.name,
                succeeded = summary.succeeded,
                failed = summary.failed,
                interrupted = summary.interrupted,
                "run complete on all workers"
            );
        }
        if summary.failed > 0 {
            error!(
                operation = %op.name,
                hosts = ?summary.failed_hosts(&results),
                "{} of {} workers failed",
                summary.failed,
                summary.total
            );
        }

        results
    }
}

/// Per-host outcome logging. Errors are never silenced.
fn report(runner: &SessionRunner, result: &RunResult, silent: bool) {
    let detail = result.error_detail.as_deref().unwrap_or("");
    if result.succeeded {
        if !silent && !runner.controller().is_cancelled() {
            info!(host = %result.host, "script completed on worker");
        }
    } else if result.interrupted {
        warn!(host = %result.host, "worker interrupted");
    } else {
        error!(host = %result.host, error = %detail, "failed on worker");
    }
}
