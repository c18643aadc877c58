//! Handle to the child process of an in-flight turn.
//!
//! The turn that spawned the child owns the wait; everyone else only holds a
//! [`ProcessHandle`], which can signal the child's process group and observe
//! its exit. Children are always started as process-group leaders, so a
//! signal also reaches anything the tool (or its terminal shim) spawned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Shared view of a running child process
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: Option<u32>,
    exited: watch::Receiver<bool>,
    interrupted: Arc<AtomicBool>,
}

/// Owner side of a [`ProcessHandle`].
///
/// Only [`mark_exited`](Self::mark_exited) flips the handle to exited.
/// Dropping the notifier without it wakes waiters but leaves `is_alive`
/// true, so an abandoned child can still be found and killed.
#[derive(Debug)]
pub struct ExitNotifier {
    tx: watch::Sender<bool>,
}

impl ExitNotifier {
    pub fn mark_exited(&self) {
        self.tx.send_replace(true);
    }
}

impl ProcessHandle {
    pub fn new(pid: Option<u32>) -> (Self, ExitNotifier) {
        let (tx, rx) = watch::channel(false);
        let handle = Self {
            pid,
            exited: rx,
            interrupted: Arc::new(AtomicBool::new(false)),
        };
        (handle, ExitNotifier { tx })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_alive(&self) -> bool {
        !*self.exited.borrow()
    }

    /// Whether someone asked this process to stop
    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Wait up to `timeout` for the child to exit. Returns true if it did.
    pub async fn wait_exit(&self, timeout: Duration) -> bool {
        let mut rx = self.exited.clone();
        let waited = tokio::time::timeout(timeout, rx.wait_for(|exited| *exited)).await;
        match waited {
            Ok(Ok(_)) => true,
            // Notifier dropped: nobody is reaping this child anymore
            Ok(Err(_)) => true,
            Err(_) => !self.is_alive(),
        }
    }

    /// Ask the child to terminate, then force-kill it if it is still alive
    /// after `grace`. Returns false if the child had already exited.
    pub async fn terminate(&self, grace: Duration) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.interrupted.store(true, Ordering::SeqCst);

        if send_terminate(self.pid) && self.wait_exit(grace).await {
            tracing::debug!(pid = ?self.pid, "Child exited after SIGTERM");
            return true;
        }

        if self.is_alive() {
            tracing::warn!(pid = ?self.pid, "Child still alive after grace period, killing");
            send_kill(self.pid);
            self.wait_exit(grace).await;
        }
        true
    }

    /// Force-kill the child's process group without waiting
    pub fn kill(&self) {
        if self.is_alive() {
            self.interrupted.store(true, Ordering::SeqCst);
            send_kill(self.pid);
        }
    }
}

/// Send SIGTERM to the child's process group.
#[cfg(unix)]
fn send_terminate(pid: Option<u32>) -> bool {
    signal_group(pid, libc::SIGTERM)
}

#[cfg(not(unix))]
fn send_terminate(_pid: Option<u32>) -> bool {
    false
}

/// Send SIGKILL to the child's process group.
#[cfg(unix)]
fn send_kill(pid: Option<u32>) -> bool {
    signal_group(pid, libc::SIGKILL)
}

#[cfg(not(unix))]
fn send_kill(pid: Option<u32>) -> bool {
    let Some(pid) = pid else {
        return false;
    };
    std::process::Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(unix)]
fn signal_group(pid: Option<u32>, signal: libc::c_int) -> bool {
    let Some(pid) = pid else {
        return false;
    };
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    // Negative pid addresses the whole process group; fall back to the
    // single process if the group is already gone.
    unsafe {
        if libc::kill(-pid, signal) == 0 {
            return true;
        }
        libc::kill(pid, signal) == 0
    }
}
