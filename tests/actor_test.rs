//! Integration tests for name-based dispatch

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fake_profile, session};
use promptline::actor::{Actionable, MonitorActor, SessionActor};
use promptline::session::Monitor;

#[tokio::test]
async fn test_session_actor_runs_turns() {
    let actor = SessionActor::new("assistant", session(fake_profile()));

    let result = actor.call_by_action_name("send_prompt", "hello").await;
    assert!(result.success, "{}", result);
    assert!(result.message.starts_with("Prompt type: response"));
    assert!(result.message.contains("new: hello"));

    let result = actor.call_by_action_name("select_choice", "1 more detail").await;
    assert!(result.success, "{}", result);
    assert!(result.message.contains("cont: I choose option 1. more detail"));

    let result = actor.call_by_action_name("last_output", "").await;
    assert!(result.message.contains("cont: I choose option 1. more detail"));

    let result = actor.call_by_action_name("capture", "").await;
    assert_eq!(result.message, "Captured: response");
}

#[tokio::test]
async fn test_session_actor_reports_errors() {
    let actor = SessionActor::new(
        "broken",
        session(promptline::config::ToolProfile::new("promptline-no-such-tool-7731")),
    );

    let result = actor.call_by_action_name("send_prompt", "hello").await;
    assert!(!result.success);
    assert!(result.message.starts_with("Error: Failed to launch"));
}

#[tokio::test]
async fn test_monitor_actor_reports_prompt_type() {
    let session = session(fake_profile());
    let actor = MonitorActor::new(
        "watcher",
        Monitor::new(Arc::clone(&session), Duration::from_millis(20)),
    );

    let result = actor.call_by_action_name("get_prompt_type", "").await;
    assert_eq!(result.message, "No output yet");

    actor.call_by_action_name("start_monitoring", "").await;
    session.send_prompt("hello").await.expect("turn");

    let mut rx = actor.monitor().subscribe();
    let seen = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|latest| latest.as_ref().is_some_and(|o| o.line_count() == 1)),
    )
    .await
    .is_ok_and(|changed| changed.is_ok());
    assert!(seen);

    let result = actor.call_by_action_name("get_prompt_type", "").await;
    assert_eq!(result.message, "Prompt type: response");

    let result = actor.call_by_action_name("latest_output", "").await;
    assert!(result.message.starts_with("Output[kind=response"));

    actor.call_by_action_name("stop_monitoring", "").await;
}

#[tokio::test]
async fn test_session_actor_answers_prompts() {
    let actor = SessionActor::new("assistant", session(fake_profile()));
    actor.call_by_action_name("send_prompt", "Delete the file?").await;

    let result = actor.call_by_action_name("send_yes", "").await;
    assert!(result.success, "{}", result);
    assert!(result.message.contains("cont: y"));

    let result = actor.call_by_action_name("send_no", "").await;
    assert!(result.message.contains("cont: n"));

    let result = actor.call_by_action_name("send_choice", " 3 ").await;
    assert!(result.success, "{}", result);
    assert!(result.message.contains("cont: 3"));

    let result = actor.call_by_action_name("send_choice", "three").await;
    assert!(!result.success);
    assert_eq!(result.message, "Invalid choice number: three");

    let result = actor.call_by_action_name("send_raw", "/compact").await;
    assert!(result.message.contains("cont: /compact"));
    assert!(
        actor
            .last_output()
            .is_some_and(|o| o.lines() == vec!["cont: /compact"])
    );
}
