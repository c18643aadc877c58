//! Session control for interactive CLI tools.
//!
//! - [`Launcher`] runs one invocation of the external program
//! - [`Classifier`] turns captured lines into an [`Output`](crate::Output)
//! - [`Session`] keeps conversation state across turns
//! - [`Monitor`] watches a session in the background

mod buffer;
mod controller;
mod launcher;
mod monitor;
mod parser;
mod process;
mod supervisor;

pub use buffer::{strip_ansi_codes, CaptureBuffer};
pub use controller::{choice_prompt, Session, SessionOptions};
pub use launcher::{
    shell_escape, LaunchOutcome, LaunchSpec, Launcher, RunningTurn, SharedBuffer, ShimMode,
};
pub use monitor::Monitor;
pub use parser::{classify, Classifier, DEFAULT_READY_MARKER, DEFAULT_TAIL_LINES};
pub use process::{ExitNotifier, ProcessHandle};
