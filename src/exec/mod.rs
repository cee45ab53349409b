// src/exec/mod.rs

//! Transport execution layer.
//!
//! This module is responsible for actually running the external transport
//! processes a session needs, using `tokio::process::Command`, and for
//! streaming their output back to the operator.
//!
//! - [`transport`] provides the `Transport` trait and the production
//!   `ExternalTransport` (rsync + ssh).
//! - [`process`] spawns one transport process, registers it for
//!   cancellation and waits for it.
//! - [`output`] multiplexes stdout/stderr into labeled lines for a `LogSink`.
//! - [`session`] runs one operation on one worker.

pub mod output;
pub mod process;
pub mod session;
pub mod transport;

pub use output::{format_line, ConsoleSink, LogSink};
pub use process::run_transport;
pub use session::SessionRunner;
pub use transport::{ExternalTransport, SyncDirection, SyncRequest, Transport};
