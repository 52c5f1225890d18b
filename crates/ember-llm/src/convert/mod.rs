//! Conversion between the canonical types and each backend's wire format
//!
//! Per backend: a pure request builder from [`crate::types::ChatRequest`]
//! into the protocol types, a stateful stream normalizer producing the
//! canonical [`crate::types::StreamEvent`] sequence, and a one-shot
//! response extractor for the non-streaming shape.

pub mod anthropic;
pub mod google;
pub mod openai;

use crate::types::StopReason;

/// Map a backend finish/stop signal into the shared vocabulary
///
/// Covers all three backends' spellings so consumers never branch on
/// backend-specific strings. Unknown values map to nothing and no stop
/// event is emitted for them.
pub(crate) fn parse_stop_reason(value: &str) -> Option<StopReason> {
    match value {
        "stop" | "end_turn" | "STOP" => Some(StopReason::Stop),
        "length" | "max_tokens" | "MAX_TOKENS" => Some(StopReason::Length),
        "tool_calls" | "tool_use" => Some(StopReason::ToolUse),
        "content_filter" | "SAFETY" => Some(StopReason::ContentFilter),
        _ => None,
    }
}
