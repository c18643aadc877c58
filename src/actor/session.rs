use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{error_result, unknown_action, Actionable};
use crate::error::SessionResult;
use crate::session::Session;
use crate::{ActionResult, Output};

/// Exposes a [`Session`]'s operations by action name
pub struct SessionActor {
    name: String,
    session: Arc<Session>,
    last: Mutex<Option<Output>>,
}

impl SessionActor {
    pub fn new(name: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            name: name.into(),
            session,
            last: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Output of the most recent successful turn
    pub fn last_output(&self) -> Option<Output> {
        self.last
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn record(&self, result: SessionResult<Output>) -> ActionResult {
        match result {
            Ok(output) => {
                let message = describe(&output);
                let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
                *last = Some(output);
                ActionResult::ok(message)
            }
            Err(e) => error_result(e),
        }
    }
}

#[async_trait]
impl Actionable for SessionActor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call_by_action_name(&self, action: &str, arg: &str) -> ActionResult {
        tracing::debug!(actor = %self.name, action, "Dispatching action");

        match action {
            "send_prompt" => self.record(self.session.send_prompt(arg).await),
            "request_choices" => self.record(self.session.request_choices(arg).await),
            "select_choice" => {
                let (number, extra) = match arg.trim().split_once(char::is_whitespace) {
                    Some((n, rest)) => (n, Some(rest)),
                    None => (arg.trim(), None),
                };
                match parse_choice(number) {
                    Some(choice) => self.record(self.session.select_choice(choice, extra).await),
                    None => ActionResult::failed(format!("Invalid choice number: {}", arg)),
                }
            }
            "send_yes" => self.record(self.session.send_yes().await),
            "send_no" => self.record(self.session.send_no().await),
            "send_choice" => match parse_choice(arg.trim()) {
                Some(choice) => self.record(self.session.send_choice(choice).await),
                None => ActionResult::failed(format!("Invalid choice number: {}", arg)),
            },
            "send_raw" => self.record(self.session.send_raw(arg).await),
            "send_follow_up" => self.record(self.session.send_follow_up(arg).await),
            "interrupt_and_send_new" => {
                self.record(self.session.interrupt_and_send_new(arg).await)
            }
            "interrupt" => {
                if self.session.interrupt().await {
                    ActionResult::ok("Interrupted")
                } else {
                    ActionResult::ok("Nothing to interrupt")
                }
            }
            "reset_session" => {
                self.session.reset_session();
                ActionResult::ok("Session reset")
            }
            "capture" => {
                let output = self.session.capture();
                ActionResult::ok(format!("Captured: {}", output.kind()))
            }
            "last_output" => match self.last_output() {
                Some(output) => ActionResult::ok(describe(&output)),
                None => ActionResult::ok("No output yet"),
            },
            _ => unknown_action(action),
        }
    }
}

/// Options are numbered from 1
fn parse_choice(number: &str) -> Option<usize> {
    number.parse::<usize>().ok().filter(|&n| n > 0)
}

/// Human-readable summary of a turn's output
fn describe(output: &Output) -> String {
    let mut text = format!("Prompt type: {}", output.kind());
    if let Some(question) = output.question() {
        text.push_str(&format!("\nQuestion: {}", question));
    }
    for (i, choice) in output.choices().iter().enumerate() {
        text.push_str(&format!("\n  {}. {}", i + 1, choice));
    }
    let body = output.text();
    if !body.trim().is_empty() {
        text.push('\n');
        text.push_str(&body);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolProfile;
    use crate::session::SessionOptions;
    use crate::PromptKind;

    fn actor() -> SessionActor {
        let session = Session::new(ToolProfile::new("true"), SessionOptions::default());
        SessionActor::new("claude", Arc::new(session))
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let result = actor().call_by_action_name("dance", "").await;
        assert!(!result.success);
        assert_eq!(result.message, "Unknown action: dance");
    }

    #[tokio::test]
    async fn test_invalid_choice_number() {
        let result = actor().call_by_action_name("select_choice", "two").await;
        assert!(!result.success);
        assert_eq!(result.message, "Invalid choice number: two");
    }

    #[tokio::test]
    async fn test_choice_zero_is_rejected() {
        let actor = actor();
        let result = actor.call_by_action_name("select_choice", "0 tell me more").await;
        assert!(!result.success);
        assert_eq!(result.message, "Invalid choice number: 0 tell me more");

        let result = actor.call_by_action_name("send_choice", "0").await;
        assert!(!result.success);
        assert_eq!(result.message, "Invalid choice number: 0");
        assert!(!actor.session().is_continuation());
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("3"), Some(3));
        assert_eq!(parse_choice("0"), None);
        assert_eq!(parse_choice("-1"), None);
        assert_eq!(parse_choice("two"), None);
    }

    #[tokio::test]
    async fn test_last_output_before_any_turn() {
        let actor = actor();
        let result = actor.call_by_action_name("last_output", "").await;
        assert!(result.success);
        assert_eq!(result.message, "No output yet");
        assert_eq!(actor.name(), "claude");
    }

    #[tokio::test]
    async fn test_interrupt_and_reset_when_idle() {
        let actor = actor();
        let result = actor.call_by_action_name("interrupt", "").await;
        assert!(result.success);
        assert_eq!(result.message, "Nothing to interrupt");

        let result = actor.call_by_action_name("reset_session", "").await;
        assert!(result.success);
        assert!(!actor.session().is_continuation());
    }

    #[test]
    fn test_describe_choices() {
        let output = Output::new(
            vec!["Pick one:".into(), "1. Go".into(), "2. Rust".into()],
            PromptKind::NumberedChoice,
            vec!["Go".into(), "Rust".into()],
            Some("Pick one:".into()),
        );
        let text = describe(&output);
        assert!(text.starts_with("Prompt type: numbered_choice"));
        assert!(text.contains("Question: Pick one:"));
        assert!(text.contains("  2. Rust"));
    }
}
