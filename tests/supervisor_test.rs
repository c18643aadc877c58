//! Integration tests for deadline supervision and fallback prompts

#![cfg(unix)]

mod common;

use std::time::{Duration, Instant};

use common::{fake_profile, session, sh_profile, CONTINUE_SCRIPT};
use promptline::SessionError;

#[tokio::test]
async fn test_fast_turn_completes_within_deadline() {
    let session = session(fake_profile());
    let output = session
        .send_prompt_with_timeout("hello", Duration::from_secs(10))
        .await
        .expect("turn");
    assert_eq!(output.lines(), vec!["new: hello"]);
}

#[tokio::test]
async fn test_timeout_interrupts_and_cleans_up() {
    let session = session(fake_profile());
    let started = Instant::now();

    let err = session
        .send_prompt_with_timeout("slow walk", Duration::from_millis(300))
        .await
        .expect_err("times out");

    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "Prompt execution timed out after 300ms");
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!session.has_active_process());

    // The session is usable again right away
    let output = session.send_prompt("hello").await.expect("next turn");
    assert_eq!(output.lines(), vec!["new: hello"]);
}

#[tokio::test]
async fn test_fallback_runs_after_timeout() {
    let session = session(fake_profile());

    let output = session
        .send_with_fallback("slow walk", Duration::from_millis(300), "quick answer")
        .await
        .expect("fallback turn");
    assert_eq!(output.lines(), vec!["new: quick answer"]);
}

#[tokio::test]
async fn test_fallback_failure_is_returned() {
    let session = session(sh_profile(
        r#"case "$1" in slow*) sleep 30 ;; *) echo "bad: $1"; exit 4 ;; esac"#,
        CONTINUE_SCRIPT,
    ));

    let err = session
        .send_with_fallback("slow walk", Duration::from_millis(200), "plan b")
        .await
        .expect_err("fallback fails");
    assert!(matches!(err, SessionError::ExternalTool { status: Some(4), .. }));
    assert!(!session.has_active_process());
}

#[tokio::test]
async fn test_fallback_not_used_for_other_failures() {
    let session = session(sh_profile(r#"echo "failed: $1"; exit 2"#, CONTINUE_SCRIPT));

    let err = session
        .send_with_fallback("first", Duration::from_secs(10), "second")
        .await
        .expect_err("tool fails");
    match err {
        SessionError::ExternalTool { status, message } => {
            assert_eq!(status, Some(2));
            assert!(message.contains("failed: first"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
