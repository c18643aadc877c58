//! External tool profiles

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::session::{LaunchSpec, ShimMode};

/// How to invoke one external conversational CLI.
///
/// Only two invocation shapes matter: one that starts a new conversation
/// and one that continues the most recent conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolProfile {
    /// Binary to run (resolved through PATH)
    pub binary: String,

    /// Arguments for a new conversation; the prompt is appended after them
    #[serde(default)]
    pub new_args: Vec<String>,

    /// Arguments that continue the most recent conversation
    #[serde(default)]
    pub continue_args: Vec<String>,

    /// Terminal shim the tool needs to produce output
    #[serde(default)]
    pub shim: ShimMode,

    /// Send the prompt on stdin when continuing (instead of as an argument)
    #[serde(default = "default_continue_via_stdin")]
    pub continue_via_stdin: bool,

    /// Extra tokens that mean "the tool is waiting at its prompt"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ready_markers: Vec<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Working directory for the tool (defaults to the current directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

fn default_continue_via_stdin() -> bool {
    true
}

impl ToolProfile {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            new_args: Vec::new(),
            continue_args: Vec::new(),
            shim: ShimMode::None,
            continue_via_stdin: true,
            ready_markers: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    /// Claude Code: `claude --print <prompt>` / `claude --print --continue`
    pub fn claude() -> Self {
        Self {
            new_args: vec!["--print".to_string()],
            continue_args: vec!["--print".to_string(), "--continue".to_string()],
            shim: ShimMode::Script,
            ready_markers: vec!["claude>".to_string()],
            ..Self::new("claude")
        }
    }

    /// Codex CLI: `codex exec <prompt>` / `codex exec resume --last`
    pub fn codex() -> Self {
        Self {
            new_args: vec!["exec".to_string()],
            continue_args: vec![
                "exec".to_string(),
                "resume".to_string(),
                "--last".to_string(),
            ],
            ..Self::new("codex")
        }
    }

    /// Build the invocation for one turn.
    ///
    /// A new conversation always carries the prompt as its trailing argument.
    /// A continuation writes it to the child's input unless the profile
    /// opts out with `continue_via_stdin = false`.
    pub fn invocation(&self, prompt: &str, continuing: bool) -> LaunchSpec {
        let mut spec = LaunchSpec::new(self.binary.clone());
        spec.shim = self.shim;
        spec.env = self.env.clone();
        spec.cwd = self.cwd.clone();

        if continuing {
            spec.args = self.continue_args.clone();
            if self.continue_via_stdin {
                spec.input = Some(prompt.to_string());
            } else {
                spec.args.push(prompt.to_string());
            }
        } else {
            spec.args = self.new_args.clone();
            spec.args.push(prompt.to_string());
        }

        spec
    }
}
