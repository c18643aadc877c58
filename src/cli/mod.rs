//! CLI command implementations

pub mod chat;
pub mod classify;
pub mod init;
pub mod prompt;

use std::sync::Arc;

use anyhow::Result;

use promptline::config::Config;
use promptline::session::Session;
use promptline::Output;

/// Build a session for `tool` (or the configured default tool)
pub(crate) fn open_session(config: &Config, tool: Option<&str>) -> Result<Arc<Session>> {
    let (name, profile) = config.get_tool(tool)?;
    let options = config.session_options(&profile);
    let session = Session::new(profile, options);
    tracing::debug!(tool = %name, session = %session.identity(), "Opened session");
    Ok(Arc::new(session))
}

/// Print an output for a human: the captured text, then what it means
pub(crate) fn print_output(output: &Output) {
    let text = output.text();
    if !text.is_empty() {
        println!("{}", text);
    }
    println!("-- {}", output.kind());
    if let Some(question) = output.question() {
        println!("   question: {}", question);
    }
    for (i, choice) in output.choices().iter().enumerate() {
        println!("   [{}] {}", i + 1, choice);
    }
}

pub(crate) fn print_json(output: &Output) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}
