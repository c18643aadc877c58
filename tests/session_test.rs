//! Integration tests for the session controller against fake tools

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fake_profile, session, sh_profile, wait_until, CONTINUE_SCRIPT, NEW_SCRIPT};
use promptline::config::ToolProfile;
use promptline::session::ShimMode;
use promptline::{PromptKind, SessionError};

#[tokio::test]
async fn test_first_turn_starts_new_conversation_then_continues() {
    let session = session(fake_profile());
    assert!(!session.is_continuation());

    let first = session.send_prompt("hello").await.expect("first turn");
    assert_eq!(first.lines(), vec!["new: hello"]);
    assert_eq!(first.kind(), PromptKind::Response);
    assert!(session.is_continuation());

    let second = session.send_prompt("again").await.expect("second turn");
    assert_eq!(second.lines(), vec!["cont: again"]);
    assert!(session.is_continuation());
    assert!(!session.has_active_process());
}

#[tokio::test]
async fn test_reset_starts_a_new_conversation() {
    let session = session(fake_profile());
    session.send_prompt("one").await.expect("first turn");
    session.reset_session();
    assert!(!session.is_continuation());

    let output = session.send_prompt("two").await.expect("after reset");
    assert_eq!(output.lines(), vec!["new: two"]);
}

#[tokio::test]
async fn test_rejected_continuation_retries_as_new_conversation() {
    let session = session(sh_profile(
        NEW_SCRIPT,
        r#"read -r line; echo "Error: session expired" >&2; exit 1"#,
    ));
    session.send_prompt("hello").await.expect("first turn");

    let output = session.send_prompt("again").await.expect("retried turn");
    assert_eq!(output.lines(), vec!["new: again"]);
    assert!(session.is_continuation());
}

#[tokio::test]
async fn test_expiry_message_with_clean_exit_still_retries() {
    let session = session(sh_profile(
        NEW_SCRIPT,
        r#"read -r line; echo "No active session found""#,
    ));
    session.send_prompt("hello").await.expect("first turn");

    let output = session.send_prompt("again").await.expect("retried turn");
    assert_eq!(output.lines(), vec!["new: again"]);
}

#[tokio::test]
async fn test_new_conversation_failure_is_reported() {
    let session = session(sh_profile(r#"echo "boom: $1" >&2; exit 3"#, CONTINUE_SCRIPT));

    let err = session.send_prompt("hello").await.expect_err("tool fails");
    assert!(matches!(err, SessionError::ExternalTool { status: Some(3), .. }));
    assert!(err.to_string().contains("boom: hello"));
    assert!(!session.is_continuation());
}

#[tokio::test]
async fn test_missing_binary_is_launch_error() {
    let session = session(ToolProfile::new("promptline-no-such-tool-7731"));
    let err = session.send_prompt("hello").await.expect_err("cannot launch");
    assert!(matches!(err, SessionError::Launch { .. }));
    assert!(!session.has_active_process());
}

#[tokio::test]
async fn test_select_choice_sends_choice_text() {
    let session = session(fake_profile());
    session.request_choices("list options").await.expect("first turn");

    let output = session
        .select_choice(2, Some("Explain it"))
        .await
        .expect("choice turn");
    assert_eq!(output.lines(), vec!["cont: I choose option 2. Explain it"]);

    let output = session.send_follow_up("thanks").await.expect("follow up");
    assert_eq!(output.lines(), vec!["cont: thanks"]);
}

#[tokio::test]
async fn test_numbered_choices_are_classified() {
    let session = session(sh_profile(
        r#"echo "Which language?"; echo "1. Go"; echo "2. Rust"; echo "3. C++""#,
        CONTINUE_SCRIPT,
    ));

    let output = session.request_choices("pick").await.expect("turn");
    assert_eq!(output.kind(), PromptKind::NumberedChoice);
    assert_eq!(output.choices(), vec!["Go", "Rust", "C++"]);
    assert_eq!(output.question(), Some("Which language?"));
}

#[tokio::test]
async fn test_interrupt_from_another_task() {
    let session = session(fake_profile());

    let runner = Arc::clone(&session);
    let turn = tokio::spawn(async move { runner.send_prompt("slow walk").await });

    assert!(wait_until(Duration::from_secs(5), || session.has_active_process()).await);
    assert!(session.interrupt().await);

    let result = turn.await.expect("turn task");
    assert!(matches!(result, Err(SessionError::Interrupted { .. })));
    assert!(!session.has_active_process());
    assert!(!session.is_continuation());

    // Nothing left to interrupt
    assert!(!session.interrupt().await);
}

#[tokio::test]
async fn test_concurrent_turn_is_rejected() {
    let session = session(fake_profile());

    let runner = Arc::clone(&session);
    let turn = tokio::spawn(async move { runner.send_prompt("slow walk").await });
    assert!(wait_until(Duration::from_secs(5), || session.has_active_process()).await);

    let err = session.send_prompt("meanwhile").await.expect_err("busy");
    assert!(matches!(err, SessionError::TurnInFlight(_)));

    session.interrupt().await;
    let _ = turn.await;
}

#[tokio::test]
async fn test_interrupt_and_send_new_replaces_running_turn() {
    let session = session(fake_profile());

    let runner = Arc::clone(&session);
    let turn = tokio::spawn(async move { runner.send_prompt("slow walk").await });
    assert!(wait_until(Duration::from_secs(5), || session.has_active_process()).await);

    let output = session
        .interrupt_and_send_new("quick one")
        .await
        .expect("replacement turn");
    assert_eq!(output.lines(), vec!["new: quick one"]);

    let first = turn.await.expect("turn task");
    assert!(matches!(first, Err(SessionError::Interrupted { .. })));
}

#[tokio::test]
async fn test_capture_sees_partial_output() {
    let session = session(sh_profile(r#"echo "Thinking..."; sleep 30"#, CONTINUE_SCRIPT));

    let runner = Arc::clone(&session);
    let turn = tokio::spawn(async move { runner.send_prompt("go").await });

    assert!(wait_until(Duration::from_secs(5), || !session.captured_lines().is_empty()).await);
    let snapshot = session.capture();
    assert_eq!(snapshot.kind(), PromptKind::Processing);
    assert_eq!(snapshot.lines(), vec!["Thinking..."]);

    session.interrupt().await;
    let _ = turn.await;
}

#[tokio::test]
async fn test_closed_session_refuses_turns() {
    let session = session(fake_profile());
    session.close().await;
    assert!(!session.is_active());

    let err = session.send_prompt("hello").await.expect_err("closed");
    assert!(matches!(err, SessionError::Closed(_)));
}

#[tokio::test]
async fn test_pty_shim_captures_output() {
    let mut profile = sh_profile(r#"echo "pty: $1""#, CONTINUE_SCRIPT);
    profile.shim = ShimMode::Pty;
    let session = session(profile);

    let output = session.send_prompt("hi").await.expect("pty turn");
    assert!(output.lines().iter().any(|l| l.contains("pty: hi")));
}

fn script_available() -> bool {
    std::process::Command::new("sh")
        .args(["-c", "command -v script"])
        .output()
        .is_ok_and(|out| out.status.success())
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_script_shim_runs_the_tool() {
    if !script_available() {
        eprintln!("script(1) not installed, skipping");
        return;
    }
    let mut profile = sh_profile(r#"echo "shim: $1""#, CONTINUE_SCRIPT);
    profile.shim = ShimMode::Script;
    let session = session(profile);

    let output = session.send_prompt("it's hi").await.expect("script turn");
    assert!(output.lines().iter().any(|l| l.contains("shim: it's hi")));
    assert!(!session.has_active_process());
}

#[tokio::test]
async fn test_answers_continue_the_conversation() {
    let session = session(fake_profile());
    session.send_prompt("Shall I proceed?").await.expect("first turn");

    let output = session.send_yes().await.expect("yes");
    assert_eq!(output.lines(), vec!["cont: y"]);

    let output = session.send_no().await.expect("no");
    assert_eq!(output.lines(), vec!["cont: n"]);

    let output = session.send_choice(2).await.expect("choice");
    assert_eq!(output.lines(), vec!["cont: 2"]);

    let output = session.send_raw("  keep   spacing").await.expect("raw");
    assert_eq!(output.lines(), vec!["cont: keep   spacing"]);
}
