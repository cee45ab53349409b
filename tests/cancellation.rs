mod common;
use crate::common::{init_tracing, operation, trace, wait_for, with_timeout, workers, Harness};

use std::os::unix::process::ExitStatusExt;
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use tokio::process::Command;

use cloudwork::engine::{
    CancelState, CancellationController, InterruptAction, RunSummary, TransportHandle,
};
use cloudwork::exec::run_transport;
use cloudwork::types::FailurePolicy;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn interrupt_terminates_in_flight_sessions_and_skips_deferred() {
    init_tracing();
    let h = Harness::new();
    let fleet = workers(&["a", "b"]);

    // `exec` so the SIGTERM lands on the process holding the pipes.
    let op = operation(
        "run",
        "echo started\nexec sleep 30\ndownload-output\n",
    );

    let orchestrator = h.orchestrator(FailurePolicy::Continue);
    let run = tokio::spawn(async move {
        orchestrator.run_operation(&fleet, None, &op, false).await
    });

    with_timeout(wait_for(|| h.sink.lines().len() == 2)).await;
    assert_eq!(h.controller.in_flight(), 2);

    assert_eq!(h.controller.interrupt(), InterruptAction::Terminating);
    assert_eq!(h.controller.state(), CancelState::CancelRequested);

    let results = with_timeout(run).await.unwrap();

    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(!result.succeeded);
        assert!(result.interrupted, "{}: {:?}", result.host, result.error_detail);
        assert!(
            !trace(&h, &result.host).iter().any(|t| t.starts_with("download")),
            "deferred directive ran on {}",
            result.host
        );
    }

    let summary = RunSummary::from_results(&results);
    assert_eq!(summary.interrupted, 2);
    assert!(!summary.all_succeeded());
    assert_eq!(h.controller.in_flight(), 0);
}

#[tokio::test]
async fn second_interrupt_escalates_to_force_exit() {
    init_tracing();
    let h = Harness::new();

    assert_eq!(h.controller.interrupt(), InterruptAction::Terminating);
    assert_eq!(h.controller.interrupt(), InterruptAction::ForceExit);
    assert_eq!(h.controller.state(), CancelState::ForceExiting);
    assert!(h.controller.is_cancelled());
}

#[tokio::test]
async fn request_termination_is_idempotent_across_sessions() {
    init_tracing();
    let h = Harness::new();
    let controller = Arc::clone(&h.controller);

    let requests: Vec<_> = (0..8)
        .map(|_| {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.request_termination() })
        })
        .collect();

    let mut granted = 0;
    for request in requests {
        if request.await.unwrap() {
            granted += 1;
        }
    }

    assert_eq!(granted, 1);
    assert_eq!(controller.state(), CancelState::CancelRequested);
}

#[tokio::test]
async fn transport_registered_after_cancellation_is_terminated_at_once() {
    init_tracing();
    let controller = CancellationController::new();
    assert!(controller.request_termination());

    let mut child = Command::new("sleep")
        .arg("30")
        .kill_on_drop(true)
        .spawn()
        .unwrap();
    let registration = controller.register("late", TransportHandle::from_child(&child));

    let status = with_timeout(child.wait()).await.unwrap();
    controller.deregister(registration);

    assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
    assert_eq!(controller.in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forced_exit_kills_transports_that_ignore_terminate() {
    init_tracing();
    let h = Harness::new();
    let controller = Arc::clone(&h.controller);
    let sink = h.sink.clone();

    // The ignored disposition survives `exec`, so `sleep` shrugs off SIGTERM.
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "trap '' TERM; echo ready; exec sleep 30"]);
    let transport = tokio::spawn(async move { run_transport("a", cmd, &controller, &sink).await });

    with_timeout(wait_for(|| !h.sink.lines().is_empty())).await;
    assert_eq!(h.controller.interrupt(), InterruptAction::Terminating);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!transport.is_finished());
    assert_eq!(h.controller.in_flight(), 1);

    // What the listener does on the second interrupt, minus `process::exit`.
    assert_eq!(h.controller.interrupt(), InterruptAction::ForceExit);
    assert_eq!(h.controller.kill_all(), 1);

    let status = with_timeout(transport).await.unwrap().unwrap();
    assert_eq!(status.signal(), Some(Signal::SIGKILL as i32));
    assert_eq!(h.controller.in_flight(), 0);
}
