use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::process::Command;

use cloudwork::exec::{SyncDirection, SyncRequest, Transport};

/// Copy `$1` to `$2`. Directories are copied by content, like `rsync -r src/ dst`.
const COPY_SCRIPT: &str = r#"set -e
if [ -d "$1" ]; then
  mkdir -p "$2"
  cp -R "$1"/. "$2"
else
  mkdir -p "$(dirname "$2")"
  cp "$1" "$2"
fi"#;

/// What the session asked the transport to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Sync {
        host: String,
        direction: SyncDirection,
        local: PathBuf,
        remote: String,
    },
    Shell {
        host: String,
    },
}

impl TransportEvent {
    pub fn host(&self) -> &str {
        match self {
            TransportEvent::Sync { host, .. } | TransportEvent::Shell { host } => host,
        }
    }
}

/// A transport that never leaves the machine.
///
/// - Each host's "remote" filesystem is `<root>/remote/<host>/`; absolute
///   remote paths are rebased under it.
/// - Sync commands run with `<root>/local` as working directory, so relative
///   local paths in directives resolve there.
/// - The payload runs with `sh` inside the host's remote directory.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    local_root: PathBuf,
    remote_root: PathBuf,
    remote_script_path: String,
    events: Arc<Mutex<Vec<TransportEvent>>>,
}

impl LocalTransport {
    pub fn new(root: &Path) -> Self {
        let local_root = root.join("local");
        let remote_root = root.join("remote");
        std::fs::create_dir_all(&local_root).expect("create local root");
        std::fs::create_dir_all(&remote_root).expect("create remote root");
        Self {
            local_root,
            remote_root,
            remote_script_path: "/tmp/cloudwork-exec.sh".to_string(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn host_root(&self, host: &str) -> PathBuf {
        self.remote_root.join(host)
    }

    /// Where `remote` lives for `host` on this machine.
    pub fn remote_path(&self, host: &str, remote: &str) -> PathBuf {
        self.host_root(host).join(remote.trim_start_matches('/'))
    }

    pub fn events(&self) -> Vec<TransportEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, host: &str) -> Vec<TransportEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.host() == host)
            .collect()
    }

    fn record(&self, event: TransportEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Transport for LocalTransport {
    fn sync_command(&self, host: &str, request: &SyncRequest) -> Command {
        self.record(TransportEvent::Sync {
            host: host.to_string(),
            direction: request.direction,
            local: request.local.clone(),
            remote: request.remote.clone(),
        });

        let remote = self.remote_path(host, &request.remote);
        let (src, dst) = match request.direction {
            SyncDirection::Upload => (request.local.clone(), remote),
            SyncDirection::Download => (remote, request.local.clone()),
        };

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(COPY_SCRIPT)
            .arg("sh")
            .arg(src)
            .arg(dst)
            .current_dir(&self.local_root);
        cmd
    }

    fn shell_command(&self, host: &str) -> Command {
        self.record(TransportEvent::Shell {
            host: host.to_string(),
        });

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(r#"cd "$1" && exec sh "$2""#)
            .arg("sh")
            .arg(self.host_root(host))
            .arg(self.remote_path(host, &self.remote_script_path));
        cmd
    }

    fn remote_script_path(&self) -> &str {
        &self.remote_script_path
    }
}
