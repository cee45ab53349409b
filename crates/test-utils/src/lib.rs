pub mod builders;
pub mod local_transport;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use cloudwork::engine::{CancellationController, Orchestrator};
use cloudwork::exec::{format_line, LogSink, SessionRunner};
use cloudwork::layout::WorkerLayout;
use cloudwork::types::FailurePolicy;
use tracing_subscriber::{fmt, EnvFilter};

pub use local_transport::{LocalTransport, TransportEvent};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Sink that keeps every labeled line in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CollectingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn lines_for(&self, host: &str) -> Vec<String> {
        let prefix = format!("[{host}] ");
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with(&prefix))
            .collect()
    }
}

impl LogSink for CollectingSink {
    fn line(&self, host: &str, line: &str) {
        self.lines.lock().unwrap().push(format_line(host, line));
    }
}

/// A temp directory with a [`LocalTransport`], a collecting sink and a fresh
/// cancellation controller, wired into session runners on demand.
///
/// The worker layout root is `workers` relative to the local root, i.e.
/// `<tmp>/local/workers/<host>/{input,output}/`.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub transport: Arc<LocalTransport>,
    pub sink: CollectingSink,
    pub controller: Arc<CancellationController>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let transport = Arc::new(LocalTransport::new(dir.path()));
        Self {
            dir,
            transport,
            sink: CollectingSink::default(),
            controller: Arc::new(CancellationController::new()),
        }
    }

    pub fn runner(&self) -> SessionRunner {
        SessionRunner::new(
            self.transport.clone(),
            self.controller.clone(),
            Arc::new(self.sink.clone()),
            WorkerLayout::new("workers"),
        )
    }

    pub fn orchestrator(&self, policy: FailurePolicy) -> Orchestrator {
        Orchestrator::new(self.runner(), policy)
    }

    /// Absolute path of `rel` under the local root.
    pub fn local(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.transport.local_root().join(rel)
    }

    pub fn write_local(&self, rel: impl AsRef<Path>, contents: &str) {
        let path = self.local(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn read_local(&self, rel: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.local(rel)).ok()
    }

    pub fn read_remote(&self, host: &str, remote: &str) -> Option<String> {
        std::fs::read_to_string(self.transport.remote_path(host, remote)).ok()
    }

    pub fn write_remote(&self, host: &str, remote: &str, contents: &str) {
        let path = self.transport.remote_path(host, remote);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
