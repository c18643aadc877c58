//! Deadline supervision for turns.
//!
//! The turn runs as its own task; if the deadline passes first the session is
//! interrupted and the task gets `timeout_grace` to wind down before it is
//! abandoned. Either way no child outlives the call.

use std::sync::Arc;
use std::time::Duration;

use super::controller::Session;
use crate::error::{SessionError, SessionResult};
use crate::Output;

impl Session {
    /// Send `prompt`, failing with [`SessionError::Timeout`] if the turn does
    /// not complete within `deadline`.
    pub async fn send_prompt_with_timeout(
        self: &Arc<Self>,
        prompt: &str,
        deadline: Duration,
    ) -> SessionResult<Output> {
        let session = Arc::clone(self);
        let prompt = prompt.to_string();
        let mut task = tokio::spawn(async move { session.send_prompt(&prompt).await });

        match tokio::time::timeout(deadline, &mut task).await {
            Ok(joined) => joined.map_err(std::io::Error::other)?,
            Err(_) => {
                tracing::warn!(
                    session = %self.identity(),
                    "Turn exceeded {}ms, interrupting",
                    deadline.as_millis()
                );
                self.interrupt().await;

                if tokio::time::timeout(self.options.timeout_grace, &mut task)
                    .await
                    .is_err()
                {
                    tracing::warn!(session = %self.identity(), "Turn did not wind down, abandoning it");
                    task.abort();
                    // Abort drops the turn future, which kills and detaches the child
                    let _ = task.await;
                }

                Err(SessionError::Timeout { after: deadline })
            }
        }
    }

    /// Send `initial`; if it times out, send `fallback` without a deadline.
    ///
    /// Only a timeout triggers the fallback. Any other failure of `initial`
    /// is returned unchanged, as is whatever the fallback turn returns.
    pub async fn send_with_fallback(
        self: &Arc<Self>,
        initial: &str,
        deadline: Duration,
        fallback: &str,
    ) -> SessionResult<Output> {
        match self.send_prompt_with_timeout(initial, deadline).await {
            Err(e) if e.is_timeout() => {
                tracing::info!(session = %self.identity(), "Initial prompt timed out, sending fallback");
                self.send_prompt(fallback).await
            }
            other => other,
        }
    }
}
