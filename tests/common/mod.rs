//! Shared test utilities: fake conversational tools built from `sh -c`

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use promptline::config::ToolProfile;
use promptline::session::{Session, SessionOptions, ShimMode};

/// A new conversation echoes its prompt; a continuation echoes stdin.
/// Prompts starting with "slow" hang.
pub const NEW_SCRIPT: &str = r#"case "$1" in slow*) sleep 30 ;; *) echo "new: $1" ;; esac"#;
pub const CONTINUE_SCRIPT: &str =
    r#"read -r line; case "$line" in slow*) sleep 30 ;; *) echo "cont: $line" ;; esac"#;

/// Build a profile running `sh -c <script> fake <prompt>` for new
/// conversations and `sh -c <script> fake` (prompt on stdin) to continue.
pub fn sh_profile(new_script: &str, continue_script: &str) -> ToolProfile {
    let mut profile = ToolProfile::new("sh");
    profile.new_args = vec!["-c".to_string(), new_script.to_string(), "fake".to_string()];
    profile.continue_args = vec![
        "-c".to_string(),
        continue_script.to_string(),
        "fake".to_string(),
    ];
    profile.shim = ShimMode::None;
    profile
}

pub fn fake_profile() -> ToolProfile {
    sh_profile(NEW_SCRIPT, CONTINUE_SCRIPT)
}

/// Short grace periods so tests that interrupt finish quickly
pub fn fast_options() -> SessionOptions {
    SessionOptions {
        interrupt_grace: Duration::from_secs(1),
        timeout_grace: Duration::from_secs(2),
        ..SessionOptions::default()
    }
}

pub fn session(profile: ToolProfile) -> Arc<Session> {
    Arc::new(Session::new(profile, fast_options()))
}

/// Poll until `cond` holds or `limit` passes. Returns whether it held.
pub async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
