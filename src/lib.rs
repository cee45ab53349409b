// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod layout;
pub mod logging;
pub mod script;
pub mod types;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::{load_and_validate, ConfigFile};
use crate::engine::{spawn_interrupt_listener, CancellationController, Orchestrator, RunSummary};
use crate::errors::CloudworkError;
use crate::exec::{ConsoleSink, ExternalTransport, SessionRunner};
use crate::fs::RealFileSystem;
use crate::layout::WorkerLayout;
use crate::script::ScriptSource;
use crate::types::FailurePolicy;

pub use crate::config::Worker;
pub use crate::engine::RunResult;
pub use crate::script::Operation;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (fatal on error, before any session starts)
/// - script resolution and the file-script confirmation prompt
/// - the cancellation controller and its Ctrl-C listener
/// - transport, session runner and orchestrator
///
/// Returns the process exit code: success only if every session succeeded.
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let fs = RealFileSystem;
    let cfg = load_and_validate(&fs, PathBuf::from(&args.config))?;

    let source = match &args.command {
        Command::Bootstrap => {
            let layout = WorkerLayout::new(cfg.work_root.clone());
            layout::bootstrap(&fs, &layout, &cfg.workers)?;
            println!("Bootstrap complete.");
            return Ok(ExitCode::SUCCESS);
        }
        Command::Run { script } => ScriptSource::from_run_arg(script),
        Command::Exec { words } => ScriptSource::Inline(words.join(" ")),
    };

    if let Some(host) = args.host.as_deref() {
        if !cfg.has_host(host) {
            return Err(CloudworkError::UnknownHost(host.to_string()).into());
        }
    }

    let op = source.resolve(&cfg, &fs)?;

    if let ScriptSource::File(path) = &source {
        if !args.yes && !confirm_file_script(&path.display().to_string()).await? {
            println!("Aborted.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let policy = args.failure_policy.unwrap_or(cfg.failure_policy);
    let summary = run_on_workers(&cfg, args.host.as_deref(), policy, &op).await;
    println!("Run complete on all workers.");

    if summary.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run_on_workers(
    cfg: &ConfigFile,
    host: Option<&str>,
    policy: FailurePolicy,
    op: &Operation,
) -> RunSummary {
    let controller = Arc::new(CancellationController::new());
    let _interrupts = spawn_interrupt_listener(Arc::clone(&controller));

    let runner = SessionRunner::new(
        Arc::new(ExternalTransport::new(cfg.transport.clone())),
        controller,
        Arc::new(ConsoleSink),
        WorkerLayout::new(cfg.work_root.clone()),
    );
    let orchestrator = Orchestrator::new(runner, policy);

    debug!(operation = %op.name, ?host, ?policy, "dispatching operation");
    let results = orchestrator.run_operation(&cfg.workers, host, op, false).await;
    RunSummary::from_results(&results)
}

/// Ask before running a local file on the whole fleet. Anything but an
/// answer starting with `y` declines.
async fn confirm_file_script(path: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(
            format!(
                "The script file '{path}' will be executed on all workers. \
                 Are you sure you want to continue? (y/N): "
            )
            .as_bytes(),
        )
        .await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(answer.trim().to_lowercase().starts_with('y'))
}
