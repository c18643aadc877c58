use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PromptKind;

/// Result of one capture-and-classify cycle.
///
/// An `Output` is a snapshot: it is never mutated after construction, and the
/// accessors that hand out lists return owned copies so callers cannot reach
/// into the stored values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    /// Captured lines in terminal order
    lines: Vec<String>,

    /// The classified interaction state
    kind: PromptKind,

    /// Extracted option texts (only for `NumberedChoice`)
    choices: Vec<String>,

    /// Prompt text the tool is asking (for questions, approvals and errors)
    question: Option<String>,

    /// When the lines were classified
    captured_at: DateTime<Utc>,
}

impl Output {
    pub fn new(
        lines: Vec<String>,
        kind: PromptKind,
        choices: Vec<String>,
        question: Option<String>,
    ) -> Self {
        Self {
            lines,
            kind,
            choices,
            question,
            captured_at: Utc::now(),
        }
    }

    /// Output for a session that has not captured anything yet
    pub fn empty() -> Self {
        Self::new(Vec::new(), PromptKind::Unknown, Vec::new(), None)
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn choices(&self) -> Vec<String> {
        self.choices.clone()
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    pub fn is_waiting_for_input(&self) -> bool {
        self.kind.is_waiting_for_input()
    }

    /// Captured text joined back into a single string
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let question = match self.question.as_deref() {
            Some(q) => q.chars().take(50).collect::<String>(),
            None => "none".to_string(),
        };
        write!(
            f,
            "Output[kind={}, choices={}, question={}]",
            self.kind,
            self.choices.len(),
            question
        )
    }
}
