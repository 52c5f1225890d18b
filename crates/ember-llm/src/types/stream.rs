use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical streaming event, identical across all backends
///
/// Every consumer processes this union and nothing else; backend-native
/// event shapes never cross this boundary. Events arrive in strict
/// wire-arrival order. `Done` is always the final event of a successful
/// sequence; a failing sequence ends with the error instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A fragment of assistant prose, append-only
    TextDelta(String),
    /// A new tool invocation has begun; `id` is unique within the response
    ToolCallStart {
        /// Call identifier later events reference
        id: String,
        /// Tool name
        name: String,
    },
    /// A fragment of a call's JSON-arguments string, concatenated in
    /// arrival order per id
    ToolCallArgumentDelta {
        /// Call this fragment belongs to
        id: String,
        /// Raw argument JSON fragment
        fragment: String,
    },
    /// The call's arguments are fully assembled and parsed; emitted exactly
    /// once per id, after all its deltas
    ToolCallComplete(ParsedToolCall),
    /// Partial token usage; may appear up to twice per response and must be
    /// summed by consumers, never overwritten
    Usage(TokenUsage),
    /// Terminal classification of why generation stopped; at most one
    Stop(StopReason),
    /// The sequence is exhausted
    Done,
}

/// A fully assembled tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedToolCall {
    /// Call identifier
    pub id: String,
    /// Tool name
    pub name: String,
    /// Parsed arguments; empty when the argument buffer was not valid JSON
    pub arguments: Map<String, Value>,
}

/// Token usage as reported by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
}

/// Why generation stopped, mapped to one vocabulary across backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of generation
    Stop,
    /// Hit the response token ceiling
    Length,
    /// Model requested tool use
    ToolUse,
    /// Content was filtered by safety systems
    ContentFilter,
}
