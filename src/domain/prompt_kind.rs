use serde::{Deserialize, Serialize};

/// The interaction state a captured terminal screen was classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Tool shows its input prompt and is ready for the next turn
    Ready,
    /// Yes/No question such as `(y/n)`
    YesNo,
    /// Numbered option list (`1. ...`, `2) ...`)
    NumberedChoice,
    /// Tool asks for permission to run a tool or command
    ToolApproval,
    /// Tool is still working on the turn
    Processing,
    /// Ordinary text reply
    Response,
    /// Error text near the end of the output
    Error,
    /// Nothing captured yet
    Unknown,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Ready => "ready",
            PromptKind::YesNo => "yes_no",
            PromptKind::NumberedChoice => "numbered_choice",
            PromptKind::ToolApproval => "tool_approval",
            PromptKind::Processing => "processing",
            PromptKind::Response => "response",
            PromptKind::Error => "error",
            PromptKind::Unknown => "unknown",
        }
    }

    /// Whether the tool is blocked waiting for the user to answer
    pub fn is_waiting_for_input(&self) -> bool {
        matches!(
            self,
            PromptKind::YesNo
                | PromptKind::NumberedChoice
                | PromptKind::ToolApproval
                | PromptKind::Ready
        )
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
