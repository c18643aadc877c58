//! Session controller.
//!
//! A [`Session`] is one logical conversation with an external CLI tool that
//! only exists as terminal text. Each turn is a separate process invocation;
//! conversational continuity comes from choosing between the tool's
//! "new conversation" and "continue most recent conversation" shapes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::buffer::CaptureBuffer;
use super::launcher::{LaunchOutcome, LaunchSpec, Launcher, SharedBuffer};
use super::parser::Classifier;
use super::process::ProcessHandle;
use crate::config::ToolProfile;
use crate::error::{SessionError, SessionResult};
use crate::Output;

/// Phrases a tool prints when it can no longer continue a conversation
const EXPIRY_PHRASES: &[&str] = &["session not found", "no active session", "session expired"];

const ANSWER_YES: &str = "y";
const ANSWER_NO: &str = "n";

/// Pause between interrupting a turn and sending the replacement prompt
const INTERRUPT_SETTLE: Duration = Duration::from_millis(500);

/// Tunables for a [`Session`]
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// How long `interrupt` waits for a clean exit before killing
    pub interrupt_grace: Duration,
    /// How long a timed-out turn gets to wind down before it is abandoned
    pub timeout_grace: Duration,
    /// Lines kept in the live capture buffer
    pub buffer_lines: usize,
    pub classifier: Classifier,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            interrupt_grace: Duration::from_secs(5),
            timeout_grace: Duration::from_secs(5),
            buffer_lines: 500,
            classifier: Classifier::default(),
        }
    }
}

/// One conversation with an external tool.
///
/// All mutable state lives behind the session's own synchronization, so a
/// session is shared as `Arc<Session>` between the turn caller, an
/// interrupting caller, and a [`Monitor`](super::Monitor).
pub struct Session {
    identity: String,
    profile: ToolProfile,
    pub(super) options: SessionOptions,
    /// false: next turn starts a new conversation; true: it continues
    continuation: AtomicBool,
    /// Child of the in-flight turn, if any
    active: Mutex<Option<ProcessHandle>>,
    /// Held for the whole duration of a turn
    turn_lock: tokio::sync::Mutex<()>,
    buffer: SharedBuffer,
    closed: AtomicBool,
}

/// Detaches the active process handle when the turn ends, however it ends
struct ActiveGuard<'a> {
    slot: &'a Mutex<Option<ProcessHandle>>,
}

impl<'a> ActiveGuard<'a> {
    fn attach(slot: &'a Mutex<Option<ProcessHandle>>, handle: ProcessHandle) -> Self {
        let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(handle);
        Self { slot }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        // Still alive here means the turn was abandoned before reaping
        if let Some(handle) = guard.take()
            && handle.is_alive()
        {
            tracing::warn!(pid = ?handle.pid(), "Turn dropped with live child, killing");
            handle.kill();
        }
    }
}

impl Session {
    /// Create a session with a fresh unique identity
    pub fn new(profile: ToolProfile, options: SessionOptions) -> Self {
        let identity = format!("session-{}", uuid::Uuid::new_v4());
        Self::with_identity(identity, profile, options)
    }

    pub fn with_identity(
        identity: impl Into<String>,
        profile: ToolProfile,
        options: SessionOptions,
    ) -> Self {
        let buffer = Arc::new(Mutex::new(CaptureBuffer::new(options.buffer_lines)));
        Self {
            identity: identity.into(),
            profile,
            options,
            continuation: AtomicBool::new(false),
            active: Mutex::new(None),
            turn_lock: tokio::sync::Mutex::new(()),
            buffer,
            closed: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn profile(&self) -> &ToolProfile {
        &self.profile
    }

    /// Whether the next turn continues the previous conversation
    pub fn is_continuation(&self) -> bool {
        self.continuation.load(Ordering::SeqCst)
    }

    /// Whether a child process is attached to this session right now
    pub fn has_active_process(&self) -> bool {
        self.active
            .lock()
            .map(|a| a.is_some())
            .unwrap_or_else(|e| e.into_inner().is_some())
    }

    /// False once the session has been closed
    pub fn is_active(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    /// Send one prompt and classify the tool's answer.
    ///
    /// Fails with [`SessionError::TurnInFlight`] if another turn is running.
    /// If a continuation is rejected by the tool (non-zero exit or an
    /// expiry message), the turn is retried once as a new conversation.
    pub async fn send_prompt(&self, prompt: &str) -> SessionResult<Output> {
        let _turn = self
            .turn_lock
            .try_lock()
            .map_err(|_| SessionError::TurnInFlight(self.identity.clone()))?;
        self.run_turn(prompt).await
    }

    async fn run_turn(&self, prompt: &str) -> SessionResult<Output> {
        if !self.is_active() {
            return Err(SessionError::Closed(self.identity.clone()));
        }

        loop {
            let continuing = self.is_continuation();
            tracing::info!(
                session = %self.identity,
                continuing,
                "Sending prompt ({} chars)",
                prompt.chars().count()
            );

            let spec = self.profile.invocation(prompt, continuing);
            let outcome = self.execute(&spec).await?;

            if outcome.interrupted {
                tracing::info!(session = %self.identity, "Turn interrupted");
                return Err(SessionError::Interrupted {
                    status: outcome.status,
                });
            }

            if !outcome.success() || mentions_expiry(&outcome.lines) {
                if continuing {
                    tracing::warn!(
                        session = %self.identity,
                        status = ?outcome.status,
                        "Continuation rejected, retrying as a new conversation"
                    );
                    self.continuation.store(false, Ordering::SeqCst);
                    continue;
                }

                return Err(SessionError::ExternalTool {
                    status: outcome.status,
                    message: failure_summary(&outcome),
                });
            }

            self.continuation.store(true, Ordering::SeqCst);
            let output = self.options.classifier.classify(&outcome.lines);
            tracing::info!(session = %self.identity, kind = %output.kind(), "Turn complete");
            return Ok(output);
        }
    }

    /// Run one invocation with the child attached for its whole lifetime
    async fn execute(&self, spec: &LaunchSpec) -> SessionResult<LaunchOutcome> {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let turn = Launcher::spawn(spec).await?;
        let _attached = ActiveGuard::attach(&self.active, turn.handle().clone());
        turn.finish(self.buffer.clone()).await
    }

    /// Stop the in-flight turn, if any.
    ///
    /// Requests termination, waits up to the interrupt grace period, then
    /// force-kills. Returns whether a live process was interrupted. Safe to
    /// call from any task, with or without a turn running.
    pub async fn interrupt(&self) -> bool {
        let handle = self
            .active
            .lock()
            .map(|a| a.clone())
            .unwrap_or_else(|e| e.into_inner().clone());

        match handle {
            Some(handle) if handle.is_alive() => {
                tracing::info!(session = %self.identity, pid = ?handle.pid(), "Interrupting turn");
                handle.terminate(self.options.interrupt_grace).await
            }
            _ => false,
        }
    }

    /// Forget the conversation; the next turn starts a new one.
    ///
    /// Does not touch a turn that is already running.
    pub fn reset_session(&self) {
        tracing::debug!(session = %self.identity, "Session reset");
        self.continuation.store(false, Ordering::SeqCst);
    }

    /// Lines captured by the current (or most recent) turn
    pub fn captured_lines(&self) -> Vec<String> {
        self.buffer
            .lock()
            .map(|b| b.snapshot())
            .unwrap_or_else(|e| e.into_inner().snapshot())
    }

    /// Classify whatever the session has captured so far.
    ///
    /// Read-only. While a turn is in flight this sees partial output.
    pub fn capture(&self) -> Output {
        self.options.classifier.classify(&self.captured_lines())
    }

    /// Ask for a numbered list of options
    pub async fn request_choices(&self, prompt: &str) -> SessionResult<Output> {
        self.send_prompt(prompt).await
    }

    /// Pick option `choice` (1-based), optionally with extra instructions
    pub async fn select_choice(&self, choice: usize, extra: Option<&str>) -> SessionResult<Output> {
        self.send_prompt(&choice_prompt(choice, extra)).await
    }

    pub async fn send_follow_up(&self, prompt: &str) -> SessionResult<Output> {
        self.send_prompt(prompt).await
    }

    /// Answer a yes/no question or a tool approval with `y`.
    ///
    /// Each turn is its own process, so an answer is simply the next
    /// continuation turn.
    pub async fn send_yes(&self) -> SessionResult<Output> {
        self.send_prompt(ANSWER_YES).await
    }

    pub async fn send_no(&self) -> SessionResult<Output> {
        self.send_prompt(ANSWER_NO).await
    }

    /// Answer a numbered-choice prompt with the bare option number
    pub async fn send_choice(&self, choice: usize) -> SessionResult<Output> {
        self.send_prompt(&choice.to_string()).await
    }

    /// Send `text` exactly as given
    pub async fn send_raw(&self, text: &str) -> SessionResult<Output> {
        self.send_prompt(text).await
    }

    /// Interrupt the running turn (if any) and send `prompt` once it is gone.
    ///
    /// Unlike [`send_prompt`](Self::send_prompt) this waits for the
    /// interrupted turn to release the session instead of failing.
    pub async fn interrupt_and_send_new(&self, prompt: &str) -> SessionResult<Output> {
        self.interrupt().await;
        tokio::time::sleep(INTERRUPT_SETTLE).await;
        let _turn = self.turn_lock.lock().await;
        self.run_turn(prompt).await
    }

    /// Tear the session down: kill any live process and refuse further turns
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(session = %self.identity, "Closing session");
        self.interrupt().await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("binary", &self.profile.binary)
            .field("continuation", &self.is_continuation())
            .field("active_process", &self.has_active_process())
            .field("closed", &!self.is_active())
            .finish()
    }
}

/// Prompt used to pick a numbered option
pub fn choice_prompt(choice: usize, extra: Option<&str>) -> String {
    match extra.map(str::trim).filter(|e| !e.is_empty()) {
        Some(extra) => format!("I choose option {}. {}", choice, extra),
        None => format!("I choose option {}", choice),
    }
}

/// Phrases must appear within a single line
fn mentions_expiry(lines: &[String]) -> bool {
    let text = lines.join("\n").to_lowercase();
    EXPIRY_PHRASES.iter().any(|p| text.contains(p))
}

/// Last few non-blank lines of a failed turn, for the error message
fn failure_summary(outcome: &LaunchOutcome) -> String {
    let tail: Vec<&str> = outcome
        .lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    let start = tail.len().saturating_sub(3);
    if tail.is_empty() {
        "no output".to_string()
    } else {
        tail[start..].join(" | ")
    }
}
