// src/engine/cancel.rs

//! Process-wide cancellation: the registry of in-flight transport processes
//! and the interrupt state machine.
//!
//! ```text
//! Idle --interrupt--> CancelRequested --interrupt--> ForceExiting
//! ```
//!
//! The first interrupt flips the shared flag and asks every registered
//! transport to terminate (SIGTERM, so `ssh` can tear down its remote side).
//! The second one SIGKILLs whatever is still registered and exits. Transports
//! run in their own process group, so nothing else reaches them.
//!
//! The controller is shared as `Arc<CancellationController>` and passed to
//! every session runner; there is no global instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const IDLE: u8 = 0;
const CANCEL_REQUESTED: u8 = 1;
const FORCE_EXITING: u8 = 2;

/// Exit status used when the operator forces an exit.
pub const FORCED_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelState {
    Idle,
    CancelRequested,
    ForceExiting,
}

/// What [`CancellationController::interrupt`] decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// First interrupt: in-flight transports were asked to terminate.
    Terminating,
    /// Second interrupt: the caller must exit the process now.
    ForceExit,
}

/// Identifies a running transport process for graceful termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportHandle {
    pid: Option<u32>,
}

impl TransportHandle {
    pub fn from_pid(pid: Option<u32>) -> Self {
        Self { pid }
    }

    pub fn from_child(child: &tokio::process::Child) -> Self {
        Self { pid: child.id() }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the process to shut down. Returns whether a signal was delivered.
    pub fn terminate(&self) -> bool {
        self.pid.is_some_and(|pid| send_signal(pid, Stop::Graceful))
    }

    /// Stop the process without giving it a chance to clean up.
    pub fn kill(&self) -> bool {
        self.pid.is_some_and(|pid| send_signal(pid, Stop::Forced))
    }
}

#[derive(Debug, Clone, Copy)]
enum Stop {
    Graceful,
    Forced,
}

#[cfg(unix)]
fn send_signal(pid: u32, stop: Stop) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let signal = match stop {
        Stop::Graceful => Signal::SIGTERM,
        Stop::Forced => Signal::SIGKILL,
    };
    match kill(Pid::from_raw(pid as i32), signal) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(e) => {
            warn!(pid, ?signal, error = %e, "failed to signal transport process");
            false
        }
    }
}

#[cfg(not(unix))]
fn send_signal(pid: u32, stop: Stop) -> bool {
    warn!(pid, ?stop, "signalling transports is not supported on this platform");
    false
}

/// Ticket returned by [`CancellationController::register`]; pass it back to
/// `deregister`. Unique per registration, so two sessions for the same host
/// never remove each other's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Registration(u64);

#[derive(Debug)]
struct Registered {
    host: String,
    handle: TransportHandle,
}

/// Shared cancellation state and registry of in-flight transports.
#[derive(Debug, Default)]
pub struct CancellationController {
    state: AtomicU8,
    next_id: AtomicU64,
    handles: Mutex<HashMap<Registration, Registered>>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CancelState {
        match self.state.load(Ordering::SeqCst) {
            IDLE => CancelState::Idle,
            CANCEL_REQUESTED => CancelState::CancelRequested,
            _ => CancelState::ForceExiting,
        }
    }

    /// True once termination was requested (and stays true).
    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) != IDLE
    }

    /// Number of transports currently registered.
    pub fn in_flight(&self) -> usize {
        self.lock_handles().len()
    }

    /// Track `handle` as the active transport of `host`'s session.
    ///
    /// If cancellation was already requested the handle is signalled right
    /// away, so a process spawned concurrently with the interrupt is not missed.
    pub fn register(&self, host: &str, handle: TransportHandle) -> Registration {
        let id = Registration(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handles = self.lock_handles();
        handles.insert(
            id,
            Registered {
                host: host.to_string(),
                handle,
            },
        );
        if self.is_cancelled() {
            debug!(host, pid = ?handle.pid(), "registered after cancellation; terminating");
            handle.terminate();
        }
        id
    }

    pub fn deregister(&self, id: Registration) {
        self.lock_handles().remove(&id);
    }

    /// Move `Idle -> CancelRequested` and signal every registered transport.
    ///
    /// Returns `false` (and does nothing) if termination was already requested.
    pub fn request_termination(&self) -> bool {
        if self
            .state
            .compare_exchange(IDLE, CANCEL_REQUESTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let handles = self.lock_handles();
        for entry in handles.values() {
            let delivered = entry.handle.terminate();
            debug!(host = %entry.host, pid = ?entry.handle.pid(), delivered, "sent terminate to transport");
        }
        true
    }

    /// SIGKILL every registered transport. Returns how many were signalled.
    pub fn kill_all(&self) -> usize {
        let handles = self.lock_handles();
        handles
            .values()
            .filter(|entry| {
                let delivered = entry.handle.kill();
                debug!(host = %entry.host, pid = ?entry.handle.pid(), delivered, "killed transport");
                delivered
            })
            .count()
    }

    /// Advance the state machine for one operator interrupt.
    pub fn interrupt(&self) -> InterruptAction {
        if self.request_termination() {
            InterruptAction::Terminating
        } else {
            self.state.store(FORCE_EXITING, Ordering::SeqCst);
            InterruptAction::ForceExit
        }
    }

    /// Kill every registered transport, then terminate the whole process.
    ///
    /// `process::exit` skips destructors, so `kill_on_drop` never fires here.
    pub fn force_exit(&self) -> ! {
        self.state.store(FORCE_EXITING, Ordering::SeqCst);
        self.kill_all();
        std::process::exit(FORCED_EXIT_CODE)
    }

    fn lock_handles(&self) -> std::sync::MutexGuard<'_, HashMap<Registration, Registered>> {
        // A panic while holding the lock cannot leave the map inconsistent.
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Listen for Ctrl-C for the lifetime of the process and drive `controller`.
pub fn spawn_interrupt_listener(controller: Arc<CancellationController>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            match controller.interrupt() {
                InterruptAction::Terminating => {
                    warn!(
                        in_flight = controller.in_flight(),
                        "received interrupt; terminating transport processes (interrupt again to exit)"
                    );
                }
                InterruptAction::ForceExit => {
                    warn!("received second interrupt; exiting");
                    controller.force_exit();
                }
            }
        }
    })
}
