//! Error types for session control

use std::time::Duration;

/// Errors returned by session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The external program could not be spawned (missing binary, permissions)
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran but the turn failed
    #[error("External tool failed (exit status {status:?}): {message}")]
    ExternalTool { status: Option<i32>, message: String },

    /// The deadline elapsed before the turn completed
    #[error("Prompt execution timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    /// The turn's process was stopped by `interrupt()`
    #[error("Turn was interrupted (exit status {status:?})")]
    Interrupted { status: Option<i32> },

    /// Another turn is already running on this session
    #[error("A turn is already in flight for session {0}")]
    TurnInFlight(String),

    /// The session was torn down
    #[error("Session {0} is closed")]
    Closed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }

    /// Exit status of the external program, when the error carries one
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            SessionError::ExternalTool { status, .. } | SessionError::Interrupted { status } => {
                *status
            }
            _ => None,
        }
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
