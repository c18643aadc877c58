use async_trait::async_trait;

use super::{unknown_action, Actionable};
use crate::session::Monitor;
use crate::ActionResult;

/// Exposes a [`Monitor`] by action name
pub struct MonitorActor {
    name: String,
    monitor: Monitor,
}

impl MonitorActor {
    pub fn new(name: impl Into<String>, monitor: Monitor) -> Self {
        Self {
            name: name.into(),
            monitor,
        }
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }
}

#[async_trait]
impl Actionable for MonitorActor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call_by_action_name(&self, action: &str, _arg: &str) -> ActionResult {
        tracing::debug!(actor = %self.name, action, "Dispatching action");

        match action {
            "start_monitoring" => {
                self.monitor.start();
                ActionResult::ok("Monitoring started")
            }
            "stop_monitoring" => {
                self.monitor.stop().await;
                ActionResult::ok("Monitoring stopped")
            }
            "check_monitoring" => {
                ActionResult::ok(format!("Monitoring: {}", self.monitor.is_running()))
            }
            "get_prompt_type" => match self.monitor.latest() {
                Some(output) => ActionResult::ok(format!("Prompt type: {}", output.kind())),
                None => ActionResult::ok("No output yet"),
            },
            "latest_output" => match self.monitor.latest() {
                Some(output) => ActionResult::ok(output.to_string()),
                None => ActionResult::ok("No output yet"),
            },
            _ => unknown_action(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::ToolProfile;
    use crate::session::{Session, SessionOptions};

    fn actor() -> MonitorActor {
        let session = Arc::new(Session::new(ToolProfile::new("true"), SessionOptions::default()));
        MonitorActor::new("watcher", Monitor::new(session, Duration::from_millis(20)))
    }

    #[tokio::test]
    async fn test_monitoring_lifecycle() {
        let actor = actor();

        let result = actor.call_by_action_name("check_monitoring", "").await;
        assert_eq!(result.message, "Monitoring: false");

        let result = actor.call_by_action_name("start_monitoring", "").await;
        assert!(result.success);
        assert_eq!(
            actor.call_by_action_name("check_monitoring", "").await.message,
            "Monitoring: true"
        );

        let result = actor.call_by_action_name("stop_monitoring", "").await;
        assert!(result.success);
        assert_eq!(
            actor.call_by_action_name("check_monitoring", "").await.message,
            "Monitoring: false"
        );

        // A second run starts cleanly after a stop
        actor.call_by_action_name("start_monitoring", "").await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            actor.call_by_action_name("check_monitoring", "").await.message,
            "Monitoring: true"
        );
        actor.call_by_action_name("stop_monitoring", "").await;
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let result = actor().call_by_action_name("startMonitoring", "").await;
        assert!(!result.success);
        assert_eq!(result.message, "Unknown action: startMonitoring");
    }
}
