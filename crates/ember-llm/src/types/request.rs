use std::time::Duration;

use super::message::ChatMessage;
use super::tool::ToolSchema;

/// Consumer-facing description of one completion
///
/// The same request drives both the streaming and one-shot paths; the
/// selected provider decides what the wire body looks like.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System prompt, placed wherever the backend expects it
    pub system: Option<String>,
    /// Conversation turns
    pub messages: Vec<ChatMessage>,
    /// Tools the model may call; empty means no tool use
    pub tools: Vec<ToolSchema>,
    /// Model identifier
    pub model: String,
    /// Response token ceiling
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Extended-reasoning settings; presence flags the model reasoning-capable
    pub reasoning: Option<ReasoningOptions>,
    /// Whole-call deadline applied to the HTTP request
    pub timeout: Option<Duration>,
}

impl ChatRequest {
    /// A request with no system prompt, tools, or tuning
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            system: None,
            messages,
            tools: Vec::new(),
            model: model.into(),
            max_tokens,
            temperature: None,
            reasoning: None,
            timeout: None,
        }
    }

    /// The simple prompt shape used by one-shot consumers
    pub fn prompt(
        model: impl Into<String>,
        system: Option<&str>,
        user_prompt: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        let mut request = Self::new(model, vec![ChatMessage::user(user_prompt)], max_tokens);
        request.system = system.map(str::to_owned);
        request
    }
}

/// Extended-reasoning settings
///
/// OpenAI-style backends map this to `reasoning_effort`; Anthropic maps it
/// to a `thinking` block whose budget competes with `max_tokens` and must be
/// compensated for by the builder.
#[derive(Debug, Clone, Copy)]
pub struct ReasoningOptions {
    /// Deliberation effort knob for OpenAI-style backends
    pub effort: ReasoningEffort,
    /// Token budget for the deliberation phase
    pub budget_tokens: u32,
}

/// Reasoning effort levels understood by OpenAI-style backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    /// Reasoning-capable model, deliberation disabled
    None,
    /// Minimal deliberation
    Low,
    /// Default deliberation
    Medium,
    /// Maximal deliberation
    High,
}

impl ReasoningEffort {
    /// Wire value for `reasoning_effort`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}
