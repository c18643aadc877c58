//! Name-based dispatch for workflow hosts.
//!
//! A host that drives sessions by action name (a workflow engine, a REPL, a
//! script) talks to [`SessionActor`] and [`MonitorActor`] through
//! [`Actionable`]. Every call yields an [`ActionResult`]; errors never escape
//! as panics or `Err`.

mod monitor;
mod session;

pub use monitor::MonitorActor;
pub use session::SessionActor;

use async_trait::async_trait;

use crate::ActionResult;

/// Something a host can drive by action name
#[async_trait]
pub trait Actionable: Send + Sync {
    /// Name the host registered this actor under
    fn name(&self) -> &str;

    /// Run the action called `action` with a single string argument.
    ///
    /// Unknown actions fail with `Unknown action: <name>`.
    async fn call_by_action_name(&self, action: &str, arg: &str) -> ActionResult;
}

fn unknown_action(action: &str) -> ActionResult {
    ActionResult::failed(format!("Unknown action: {}", action))
}

fn error_result(err: impl std::fmt::Display) -> ActionResult {
    ActionResult::failed(format!("Error: {}", err))
}
