//! Background monitor.
//!
//! Periodically captures a session's output and reports when the
//! classification changes. The monitor only reads; it never starts or stops
//! turns.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::controller::Session;
use crate::Output;

type ChangeCallback = Arc<dyn Fn(&Output) + Send + Sync>;

/// One run of the poll loop, from `start` to `stop`
struct PollRun {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollRun {
    fn is_live(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Polls a [`Session`] and publishes changes
pub struct Monitor {
    session: Arc<Session>,
    interval: Duration,
    stop_grace: Duration,
    latest: watch::Sender<Option<Arc<Output>>>,
    callback: Arc<Mutex<Option<ChangeCallback>>>,
    run: Mutex<Option<PollRun>>,
}

impl Monitor {
    pub fn new(session: Arc<Session>, interval: Duration) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            session,
            interval,
            stop_grace: Duration::from_secs(2),
            latest,
            callback: Arc::new(Mutex::new(None)),
            run: Mutex::new(None),
        }
    }

    /// How long [`stop`](Self::stop) waits for the loop to finish
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Whether a poll loop is alive. Turns false on its own once the
    /// session is closed.
    pub fn is_running(&self) -> bool {
        self.run
            .lock()
            .map(|r| r.as_ref().is_some_and(PollRun::is_live))
            .unwrap_or_else(|e| e.into_inner().as_ref().is_some_and(PollRun::is_live))
    }

    /// Most recent output the monitor observed
    pub fn latest(&self) -> Option<Arc<Output>> {
        self.latest.borrow().clone()
    }

    /// Receive every published change
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Output>>> {
        self.latest.subscribe()
    }

    /// Register a callback invoked on every change, replacing any previous one
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&Output) + Send + Sync + 'static,
    {
        let mut slot = self.callback.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(callback));
    }

    /// Start polling. Calling this while already running does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut run = self.run.lock().unwrap_or_else(|e| e.into_inner());
        if run.as_ref().is_some_and(PollRun::is_live) {
            tracing::debug!(session = %self.session.identity(), "Monitor already running");
            return;
        }

        // Every run gets its own stop channel so a stale stop never ends a new run
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.session),
            self.interval,
            stop_rx,
            self.latest.clone(),
            Arc::clone(&self.callback),
        ));

        tracing::info!(session = %self.session.identity(), "Monitor started");
        *run = Some(PollRun { stop, task });
    }

    /// Stop polling and wait (bounded) for the loop to finish.
    ///
    /// Stopping a monitor that is not running does nothing.
    pub async fn stop(&self) {
        let run = self
            .run
            .lock()
            .map(|mut r| r.take())
            .unwrap_or_else(|e| e.into_inner().take());
        let Some(PollRun { stop, mut task }) = run else {
            return;
        };
        if task.is_finished() {
            return;
        }

        stop.send_replace(true);
        if tokio::time::timeout(self.stop_grace, &mut task).await.is_err() {
            tracing::warn!(session = %self.session.identity(), "Monitor loop did not stop in time");
            task.abort();
        }

        tracing::info!(session = %self.session.identity(), "Monitor stopped");
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let Ok(mut run) = self.run.lock()
            && let Some(run) = run.take()
        {
            run.task.abort();
        }
    }
}

async fn poll_loop(
    session: Arc<Session>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
    latest: watch::Sender<Option<Arc<Output>>>,
    callback: Arc<Mutex<Option<ChangeCallback>>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut previous: Option<Arc<Output>> = latest.borrow().clone();

    loop {
        tokio::select! {
            // Err means the Monitor is gone
            changed = stop.changed() => if changed.is_err() { break },
            _ = ticker.tick() => {}
        }
        if *stop.borrow() {
            break;
        }
        if !session.is_active() {
            tracing::debug!(session = %session.identity(), "Session closed, monitor exiting");
            break;
        }

        let current = session.capture();
        if !has_changed(previous.as_deref(), &current) {
            continue;
        }

        tracing::debug!(
            session = %session.identity(),
            kind = %current.kind(),
            "Monitor observed change"
        );
        let current = Arc::new(current);
        previous = Some(Arc::clone(&current));
        latest.send_replace(Some(Arc::clone(&current)));

        let cb = callback
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|e| e.into_inner().clone());
        if let Some(cb) = cb {
            cb(&current);
        }
    }
}

/// A change is a different classification or a different amount of output
fn has_changed(previous: Option<&Output>, current: &Output) -> bool {
    match previous {
        None => true,
        Some(prev) => prev.kind() != current.kind() || prev.line_count() != current.line_count(),
    }
}
