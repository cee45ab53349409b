mod common;
use crate::common::{init_tracing, operation, trace, with_timeout, Harness};

use cloudwork::config::Worker;
use cloudwork::types::FailurePolicy;

const PAYLOAD_PATH: &str = "/tmp/cloudwork-exec.sh";

#[tokio::test]
async fn directives_wrap_the_payload_on_every_worker() {
    init_tracing();
    let h = Harness::new();
    h.write_local("in/data.txt", "input");
    for host in ["a", "b"] {
        h.write_remote(host, &format!("/remote/out/result-{host}.txt"), host);
    }

    let op = operation(
        "run",
        "upload ./in /remote/in\necho hi\ndownload /remote/out ./out\n",
    );
    let workers = vec![Worker::new("a"), Worker::new("b")];

    let results = with_timeout(
        h.orchestrator(FailurePolicy::Continue)
            .run_operation(&workers, None, &op, false),
    )
    .await;

    assert_eq!(results.len(), 2);
    for (result, host) in results.iter().zip(["a", "b"]) {
        assert_eq!(result.host, host);
        assert!(result.succeeded, "{host}: {:?}", result.error_detail);

        assert_eq!(
            trace(&h, host),
            vec![
                "upload /remote/in".to_string(),
                format!("upload {PAYLOAD_PATH}"),
                "shell".to_string(),
                "download /remote/out".to_string(),
            ]
        );
        assert_eq!(h.read_remote(host, PAYLOAD_PATH).as_deref(), Some("echo hi\n"));
        assert_eq!(h.read_remote(host, "/remote/in/data.txt").as_deref(), Some("input"));
        assert_eq!(
            h.read_local(format!("out/result-{host}.txt")).as_deref(),
            Some(host)
        );
        assert_eq!(h.sink.lines_for(host), vec![format!("[{host}] hi")]);
    }
}

#[tokio::test]
async fn deferred_directives_run_after_a_failed_payload() {
    init_tracing();
    let h = Harness::new();
    h.write_remote("a", "/remote/out/log.txt", "partial");

    let op = operation(
        "run",
        "echo before\nexit 4\ndownload /remote/out ./out\n",
    );
    let result = with_timeout(h.runner().run_session(&Worker::new("a"), &op, true)).await;

    assert!(!result.succeeded);
    assert!(!result.interrupted);
    let detail = result.error_detail.unwrap();
    assert!(detail.contains("remote script failed on a"), "{detail}");

    assert_eq!(
        trace(&h, "a"),
        vec![
            format!("upload {PAYLOAD_PATH}"),
            "shell".to_string(),
            "download /remote/out".to_string(),
        ]
    );
    assert_eq!(h.read_local("out/log.txt").as_deref(), Some("partial"));
    assert_eq!(h.sink.lines(), vec!["[a] before".to_string()]);
}

#[tokio::test]
async fn failing_deferred_download_fails_the_session_but_later_ones_still_run() {
    init_tracing();
    let h = Harness::new();
    h.write_remote("a", "/present/file.txt", "kept");

    let op = operation(
        "run",
        "echo fine\ndownload /missing ./lost\ndownload /present ./kept\n",
    );
    let result = with_timeout(h.runner().run_session(&Worker::new("a"), &op, true)).await;

    assert!(!result.succeeded);
    let detail = result.error_detail.unwrap();
    assert!(detail.contains("a:/missing"), "{detail}");
    assert_eq!(h.read_local("kept/file.txt").as_deref(), Some("kept"));
    assert_eq!(h.sink.lines_for("a").first().map(String::as_str), Some("[a] fine"));
}

#[tokio::test]
async fn failed_immediate_upload_never_reaches_the_shell() {
    init_tracing();
    let h = Harness::new();

    let op = operation(
        "run",
        "upload ./does-not-exist /remote/in\necho never\ndownload /remote/out ./out\n",
    );
    let result = with_timeout(h.runner().run_session(&Worker::new("a"), &op, true)).await;

    assert!(!result.succeeded);
    assert!(!result.interrupted);
    assert!(result.error_detail.unwrap().contains("upload"));
    assert_eq!(trace(&h, "a"), vec!["upload /remote/in".to_string()]);
    assert!(h.read_remote("a", PAYLOAD_PATH).is_none());
    assert!(!h.sink.lines().iter().any(|l| l.contains("never")));
}

#[tokio::test]
async fn shorthands_use_worker_layout_and_operation_defaults() {
    init_tracing();
    let h = Harness::new();
    h.write_local("workers/a/input/x.txt", "payload input");

    // The local transport runs the payload inside the host's remote root,
    // so the remote defaults are reachable through relative paths.
    let op = operation(
        "run",
        "upload-input\n\
         mkdir -p tmp/worker/output\n\
         cp tmp/worker/input/x.txt tmp/worker/output/y.txt\n\
         download-output\n",
    );
    let result = with_timeout(h.runner().run_session(&Worker::new("a"), &op, true)).await;

    assert!(result.succeeded, "{:?}", result.error_detail);
    assert_eq!(
        trace(&h, "a"),
        vec![
            "upload /tmp/worker/input".to_string(),
            format!("upload {PAYLOAD_PATH}"),
            "shell".to_string(),
            "download /tmp/worker/output".to_string(),
        ]
    );
    assert_eq!(
        h.read_local("workers/a/output/y.txt").as_deref(),
        Some("payload input")
    );
}

#[tokio::test]
async fn shorthand_with_explicit_remote_overrides_the_default() {
    init_tracing();
    let h = Harness::new();
    h.write_local("workers/a/input/x.txt", "x");

    let op = operation("run", "upload-input /custom/in\ntest -f custom/in/x.txt\n");
    let result = with_timeout(h.runner().run_session(&Worker::new("a"), &op, true)).await;

    assert!(result.succeeded, "{:?}", result.error_detail);
    assert_eq!(trace(&h, "a")[0], "upload /custom/in");
}

#[tokio::test]
async fn malformed_directives_are_dropped_from_the_payload() {
    init_tracing();
    let h = Harness::new();

    let op = operation("run", "upload only-one-token\necho still runs\n");
    let result = with_timeout(h.runner().run_session(&Worker::new("a"), &op, true)).await;

    assert!(result.succeeded, "{:?}", result.error_detail);
    assert_eq!(
        h.read_remote("a", PAYLOAD_PATH).as_deref(),
        Some("echo still runs\n")
    );
    assert_eq!(trace(&h, "a"), vec![format!("upload {PAYLOAD_PATH}"), "shell".to_string()]);
}

#[tokio::test]
async fn stdout_and_stderr_are_labeled_with_the_host() {
    init_tracing();
    let h = Harness::new();

    let op = operation("run", "echo to-stdout\necho to-stderr >&2\n");
    let result = with_timeout(h.runner().run_session(&Worker::new("web-1"), &op, true)).await;

    assert!(result.succeeded);
    let mut lines = h.sink.lines();
    lines.sort();
    assert_eq!(
        lines,
        vec!["[web-1] to-stderr".to_string(), "[web-1] to-stdout".to_string()]
    );
}

#[tokio::test]
async fn payload_stdin_is_closed() {
    init_tracing();
    let h = Harness::new();

    let op = operation("run", "if read line; then echo got-input; else echo eof; fi\n");
    let result = with_timeout(h.runner().run_session(&Worker::new("a"), &op, true)).await;

    assert!(result.succeeded);
    assert_eq!(h.sink.lines(), vec!["[a] eof".to_string()]);
}

#[tokio::test]
async fn session_started_after_cancellation_is_interrupted() {
    init_tracing();
    let h = Harness::new();
    assert!(h.controller.request_termination());

    let op = operation("run", "echo never\ndownload /remote/out ./out\n");
    let result = with_timeout(h.runner().run_session(&Worker::new("a"), &op, true)).await;

    assert!(!result.succeeded);
    assert!(result.interrupted);
    assert!(!trace(&h, "a").contains(&"shell".to_string()));
    assert!(h.sink.lines().is_empty());
}
