//! Settings configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// General settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Tool used when none is given on the command line
    #[serde(default = "default_tool")]
    pub default_tool: String,

    /// Poll period of the background monitor
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,

    /// How long `interrupt` waits for a clean exit before killing
    #[serde(default = "default_grace_ms")]
    pub interrupt_grace_ms: u64,

    /// How long a timed-out turn gets to wind down after being interrupted
    #[serde(default = "default_grace_ms")]
    pub timeout_grace_ms: u64,

    /// How long `stop` waits for the monitor loop to finish
    #[serde(default = "default_monitor_stop_grace_ms")]
    pub monitor_stop_grace_ms: u64,

    /// Trailing lines inspected by the classifier
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,

    /// Lines kept in the live capture buffer
    #[serde(default = "default_buffer_lines")]
    pub buffer_lines: usize,
}

fn default_tool() -> String {
    "claude".to_string()
}

fn default_monitor_interval_ms() -> u64 {
    1000
}

fn default_grace_ms() -> u64 {
    5000
}

fn default_monitor_stop_grace_ms() -> u64 {
    2000
}

fn default_tail_lines() -> usize {
    crate::session::DEFAULT_TAIL_LINES
}

fn default_buffer_lines() -> usize {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_tool: default_tool(),
            monitor_interval_ms: default_monitor_interval_ms(),
            interrupt_grace_ms: default_grace_ms(),
            timeout_grace_ms: default_grace_ms(),
            monitor_stop_grace_ms: default_monitor_stop_grace_ms(),
            tail_lines: default_tail_lines(),
            buffer_lines: default_buffer_lines(),
        }
    }
}

impl Settings {
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn monitor_stop_grace(&self) -> Duration {
        Duration::from_millis(self.monitor_stop_grace_ms)
    }
}
