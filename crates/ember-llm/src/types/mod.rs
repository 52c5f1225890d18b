//! Provider-agnostic types for LLM requests and responses
//!
//! Everything consumers hand to the client (conversations, tool schemas,
//! provider targets) and everything they get back (the canonical stream
//! event union, one-shot outcomes) lives here. Backend wire formats never
//! leak through these types.

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod target;
pub mod tool;

pub use message::{ChatMessage, FunctionCall, Role, ToolCall};
pub use request::{ChatRequest, ReasoningEffort, ReasoningOptions};
pub use response::{Completion, CompletionOutcome, ToolSupport};
pub use stream::{ParsedToolCall, StopReason, StreamEvent, TokenUsage};
pub use target::ProviderTarget;
pub use tool::{ParameterKind, ToolParameter, ToolSchema};
