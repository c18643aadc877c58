//! Core domain types for promptline

mod action;
mod output;
mod prompt_kind;

pub use action::ActionResult;
pub use output::Output;
pub use prompt_kind::PromptKind;
