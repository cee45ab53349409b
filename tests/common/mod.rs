#![allow(dead_code)]

pub use cloudwork_test_utils::builders::{operation, workers, ConfigFileBuilder};
pub use cloudwork_test_utils::{
    init_tracing, with_timeout, CollectingSink, Harness, LocalTransport, TransportEvent,
};

use std::time::Duration;

/// One host's transport calls as short strings: `upload <remote>`,
/// `download <remote>` or `shell`.
pub fn trace(h: &Harness, host: &str) -> Vec<String> {
    h.transport
        .events_for(host)
        .into_iter()
        .map(|event| match event {
            TransportEvent::Sync {
                direction, remote, ..
            } => format!("{direction} {remote}"),
            TransportEvent::Shell { .. } => "shell".to_string(),
        })
        .collect()
}

/// Poll until `cond` holds. Pair with [`with_timeout`].
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    while !cond() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
