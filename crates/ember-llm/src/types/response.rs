use serde::{Deserialize, Serialize};

use super::stream::TokenUsage;

/// Raw one-shot result a provider hands to the façade
///
/// Text is concatenated from the backend's content blocks; usage is absent
/// when the backend omitted it and the façade substitutes an estimate.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Concatenated assistant text
    pub text: String,
    /// Backend-reported usage, if any
    pub usage: Option<TokenUsage>,
}

/// One-shot completion result with usage accounting applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// Assistant text
    pub content: String,
    /// Prompt tokens, reported or estimated
    pub prompt_tokens: u32,
    /// Completion tokens, reported or estimated
    pub completion_tokens: u32,
    /// Whether the token counts came from the estimator instead of the backend
    pub estimated: bool,
}

/// Answer of a tool-capability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSupport {
    /// The model is known to support tool calls
    Supported,
    /// The model is known to reject tool calls
    Unsupported,
    /// No probe was performed; a tool-call attempt fails naturally at runtime
    Unknown,
}
