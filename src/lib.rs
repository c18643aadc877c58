//! promptline - turn-based control of interactive CLI tools
//!
//! Some conversational tools (coding assistants and the like) only expose
//! themselves as terminal text. promptline drives them one turn at a time:
//! every prompt is a separate invocation of the tool, continuity comes from
//! the tool's own "continue the last conversation" mode, and the text the
//! tool prints is classified heuristically into a [`PromptKind`].
//!
//! ## Pieces
//!
//! - [`session::Launcher`] spawns the tool, optionally behind a terminal shim,
//!   and captures its merged output.
//! - [`session::Classifier`] maps captured lines to an [`Output`].
//! - [`session::Session`] tracks continuation state, retries expired
//!   conversations, supports interruption and deadlines.
//! - [`session::Monitor`] polls a session in the background.
//! - [`actor`] exposes sessions and monitors to hosts that dispatch by name.

pub mod actor;
pub mod config;
pub mod domain;
pub mod error;
pub mod session;

pub use domain::*;
pub use error::{SessionError, SessionResult};
