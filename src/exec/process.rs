// src/exec/process.rs

//! Spawning one transport process and waiting for it.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::debug;

use crate::engine::{CancellationController, TransportHandle};
use crate::errors::{CloudworkError, Result};
use crate::exec::output::{forward_output, LogSink};

/// Run `cmd` on behalf of `host`'s session and return its exit status.
///
/// - Refuses to start anything once cancellation was requested
///   (`Interrupted`). This is the session's checkpoint before each
///   transport call.
/// - stdin is closed; stdout and stderr are streamed line by line to `sink`.
/// - The process is registered with `controller` from spawn until it has
///   exited, so an interrupt can ask it to terminate. The call still waits
///   for the process to actually exit.
pub async fn run_transport(
    host: &str,
    mut cmd: Command,
    controller: &CancellationController,
    sink: &dyn LogSink,
) -> Result<ExitStatus> {
    if controller.is_cancelled() {
        return Err(CloudworkError::Interrupted {
            host: host.to_string(),
        });
    }

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Keep terminal Ctrl-C away from transports; the controller decides
    // when and how they are stopped.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| CloudworkError::Spawn {
        host: host.to_string(),
        program: program.clone(),
        source,
    })?;

    let handle = TransportHandle::from_child(&child);
    debug!(host, program = %program, pid = ?handle.pid(), "transport started");
    let registration = controller.register(host, handle);

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (status, ()) = tokio::join!(child.wait(), forward_output(host, stdout, stderr, sink));

    controller.deregister(registration);

    let status = status?;
    debug!(host, program = %program, %status, "transport exited");
    Ok(status)
}
