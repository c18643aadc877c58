//! Output classifier.
//!
//! Maps a captured line sequence to an [`Output`]. Classification is a pure
//! function of the lines: no I/O, no state. The checks run in a fixed
//! priority order and the first match wins:
//!
//! 1. no lines at all                                  -> `Unknown`
//! 2. last non-blank line ends with `>`/`$` or holds a
//!    ready marker                                     -> `Ready`
//! 3. numbered option lines in the tail                -> `NumberedChoice`
//! 4. yes/no sentinel on the last line                 -> `YesNo`
//! 5. approval wording in the tail                     -> `ToolApproval`
//! 6. progress wording or an ellipsis on the last line -> `Processing`
//! 7. error wording in the tail                        -> `Error`
//! 8. anything else                                    -> `Response`
//!
//! The tail is the final [`DEFAULT_TAIL_LINES`] lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Output, PromptKind};

/// Number of trailing lines inspected for multi-line patterns
pub const DEFAULT_TAIL_LINES: usize = 10;

/// Default token that marks the tool's own input prompt
pub const DEFAULT_READY_MARKER: &str = "claude>";

static NUMBERED_CHOICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s+(.+)$").expect("valid numbered choice regex"));

static YES_NO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\(y/n\)|\[y/n\]|\(yes/no\)").expect("valid yes/no regex")
});

const APPROVAL_WORDS: &[&str] = &["approve", "allow", "proceed"];
const PROCESSING_WORDS: &[&str] = &["processing", "thinking", "working"];
const ERROR_WORDS: &[&str] = &["error", "failed", "exception"];

/// Heuristic classifier for captured terminal text
#[derive(Debug, Clone)]
pub struct Classifier {
    tail_lines: usize,
    ready_markers: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            tail_lines: DEFAULT_TAIL_LINES,
            ready_markers: vec![DEFAULT_READY_MARKER.to_string()],
        }
    }
}

impl Classifier {
    pub fn new(tail_lines: usize, ready_markers: Vec<String>) -> Self {
        Self {
            tail_lines: tail_lines.max(1),
            ready_markers,
        }
    }

    /// Classify captured lines into an [`Output`]
    pub fn classify(&self, lines: &[String]) -> Output {
        if lines.is_empty() {
            return Output::new(Vec::new(), PromptKind::Unknown, Vec::new(), None);
        }

        let owned = lines.to_vec();
        let last = last_non_blank(lines);
        let tail = tail_lines(lines, self.tail_lines);
        let tail_text = tail.join("\n");
        let tail_lower = tail_text.to_lowercase();
        let last_lower = last.to_lowercase();

        if self.is_ready(last) {
            return Output::new(owned, PromptKind::Ready, Vec::new(), None);
        }

        let choices = extract_choices(tail);
        if !choices.is_empty() {
            let question = extract_question(tail);
            return Output::new(owned, PromptKind::NumberedChoice, choices, question);
        }

        if YES_NO.is_match(last) {
            return Output::new(owned, PromptKind::YesNo, Vec::new(), Some(last.to_string()));
        }

        let asks_approval = APPROVAL_WORDS.iter().any(|w| tail_lower.contains(w))
            || (tail_lower.contains("tool") && YES_NO.is_match(&tail_text));
        if asks_approval {
            return Output::new(
                owned,
                PromptKind::ToolApproval,
                Vec::new(),
                Some(last.to_string()),
            );
        }

        let in_progress = PROCESSING_WORDS.iter().any(|w| last_lower.contains(w))
            || last.contains("...")
            || last.contains('\u{2026}');
        if in_progress {
            return Output::new(owned, PromptKind::Processing, Vec::new(), None);
        }

        if ERROR_WORDS.iter().any(|w| tail_lower.contains(w)) {
            return Output::new(owned, PromptKind::Error, Vec::new(), Some(last.to_string()));
        }

        Output::new(owned, PromptKind::Response, Vec::new(), None)
    }

    fn is_ready(&self, last: &str) -> bool {
        last.ends_with('>')
            || last.ends_with('$')
            || starts_with_sentinel(last)
            || self
                .ready_markers
                .iter()
                .any(|m| !m.is_empty() && last.contains(m.as_str()))
    }
}

/// Classify with the default settings
pub fn classify(lines: &[String]) -> Output {
    Classifier::default().classify(lines)
}

/// `>` or `$` standing alone at the start of the line, as in `> ready`
fn starts_with_sentinel(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(chars.next(), Some('>' | '$'))
        && chars.next().is_none_or(char::is_whitespace)
}

/// Last line with visible content, trimmed; empty if every line is blank
fn last_non_blank(lines: &[String]) -> &str {
    lines
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

fn tail_lines(lines: &[String], n: usize) -> &[String] {
    &lines[lines.len().saturating_sub(n)..]
}

fn extract_choices(tail: &[String]) -> Vec<String> {
    tail.iter()
        .filter_map(|line| NUMBERED_CHOICE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// The nearest non-blank, non-option line above the topmost option line.
fn extract_question(tail: &[String]) -> Option<String> {
    let first_option = tail.iter().position(|l| NUMBERED_CHOICE.is_match(l))?;
    tail[..first_option]
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
