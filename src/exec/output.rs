// src/exec/output.rs

//! Fan-in of a transport's stdout and stderr into one labeled line stream.
//!
//! One reader task per stream pushes lines into a shared bounded channel.
//! Each reader owns a sender clone, so the channel closes exactly when both
//! readers have hit EOF, and the consuming loop ends deterministically.
//! Interleaving between the two streams follows arrival order.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

const LINE_CHANNEL_CAPACITY: usize = 10;

/// Destination for remote output lines.
pub trait LogSink: Send + Sync {
    /// Called once per output line, in arrival order for a given session.
    fn line(&self, host: &str, line: &str);
}

/// `[<host>] <line>`
pub fn format_line(host: &str, line: &str) -> String {
    format!("[{host}] {line}")
}

/// Writes labeled lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn line(&self, host: &str, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout is not a reason to fail the session.
        let _ = writeln!(out, "{}", format_line(host, line));
    }
}

/// Drain `stdout` and `stderr` concurrently, forwarding every line to `sink`.
///
/// Returns once both streams reached EOF and every line has been delivered.
pub async fn forward_output<O, E>(
    host: &str,
    stdout: Option<O>,
    stderr: Option<E>,
    sink: &dyn LogSink,
) where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = stdout {
        readers.push(spawn_reader(host, "stdout", stdout, tx.clone()));
    }
    if let Some(stderr) = stderr {
        readers.push(spawn_reader(host, "stderr", stderr, tx.clone()));
    }
    drop(tx);

    while let Some(line) = rx.recv().await {
        sink.line(host, &line);
    }

    for reader in readers {
        if let Err(e) = reader.await {
            debug!(host, error = %e, "output reader task ended abnormally");
        }
    }
}

fn spawn_reader<R>(
    host: &str,
    stream: &'static str,
    reader: R,
    tx: mpsc::Sender<String>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let host = host.to_string();
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(host = %host, stream, error = %e, "error reading transport output");
                    break;
                }
            }
        }
    })
}
