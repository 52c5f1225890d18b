//! Reassembly of tool-call arguments that arrive fragmented across stream
//! chunks
//!
//! One accumulator lives per streaming request and dies with it. Entries
//! are keyed by the backend's wire index (OpenAI `tool_calls[].index`,
//! Anthropic content-block index) or by an ordinal the normalizer assigns
//! (Google). An entry that is started but never finished is dropped with
//! the request; no completion event is ever synthesized for it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::types::ParsedToolCall;

/// Per-request table of in-flight tool calls
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    pending: BTreeMap<u32, PendingCall>,
}

#[derive(Debug)]
struct PendingCall {
    id: String,
    name: String,
    argument_buffer: String,
}

impl ToolCallAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the first sighting of a call at `index`
    ///
    /// A repeated start for the same index resets its buffer; backends do
    /// not reuse indices within one response.
    pub fn start(&mut self, index: u32, id: String, name: String) {
        self.pending.insert(
            index,
            PendingCall {
                id,
                name,
                argument_buffer: String::new(),
            },
        );
    }

    /// Append an argument-JSON fragment to the call at `index`
    ///
    /// Fragments for an index that was never started are dropped; a call
    /// whose start was lost must never materialize.
    pub fn append(&mut self, index: u32, fragment: &str) {
        if let Some(call) = self.pending.get_mut(&index) {
            call.argument_buffer.push_str(fragment);
        }
    }

    /// The id of the in-flight call at `index`, if any
    pub fn id_for(&self, index: u32) -> Option<&str> {
        self.pending.get(&index).map(|call| call.id.as_str())
    }

    /// Materialize and remove the call at `index`
    pub fn finish(&mut self, index: u32) -> Option<ParsedToolCall> {
        self.pending.remove(&index).map(PendingCall::into_parsed)
    }

    /// Materialize and remove every in-flight call, in ascending index order
    ///
    /// Used by backends that signal completion once per response
    /// (`finish_reason`) rather than per call.
    pub fn finish_all(&mut self) -> Vec<ParsedToolCall> {
        let pending = std::mem::take(&mut self.pending);
        pending.into_values().map(PendingCall::into_parsed).collect()
    }
}

impl PendingCall {
    fn into_parsed(self) -> ParsedToolCall {
        ParsedToolCall {
            id: self.id,
            name: self.name,
            arguments: parse_arguments(&self.argument_buffer),
        }
    }
}

/// Parse a concatenated argument buffer into a structured map
///
/// Anything that is not a JSON object (including an empty buffer and
/// truncated JSON) yields an empty map; malformed arguments must never
/// abort the response.
fn parse_arguments(buffer: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(buffer) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_fragments_in_order() {
        let full = r#"{"path":"/tmp/logs","recursive":true,"depth":3}"#;

        // Any split of the argument JSON must reassemble to the same map
        for split_count in 1..=full.len() {
            let mut acc = ToolCallAccumulator::new();
            acc.start(0, "call_1".to_owned(), "list_dir".to_owned());

            let chunk = full.len().div_ceil(split_count);
            let bytes = full.as_bytes();
            let mut offset = 0;
            while offset < bytes.len() {
                let end = (offset + chunk).min(bytes.len());
                acc.append(0, std::str::from_utf8(&bytes[offset..end]).unwrap());
                offset = end;
            }

            let call = acc.finish(0).unwrap();
            let expected: Map<String, Value> = serde_json::from_str(full).unwrap();
            assert_eq!(call.arguments, expected, "split into {split_count} fragments");
        }
    }

    #[test]
    fn malformed_arguments_yield_empty_map() {
        let mut acc = ToolCallAccumulator::new();
        acc.start(0, "call_1".to_owned(), "read_file".to_owned());
        acc.append(0, r#"{"path": "/tmp/never-clos"#);

        let call = acc.finish(0).unwrap();
        assert_eq!(call.name, "read_file");
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn non_object_arguments_yield_empty_map() {
        let mut acc = ToolCallAccumulator::new();
        acc.start(0, "call_1".to_owned(), "noop".to_owned());
        acc.append(0, "[1, 2, 3]");

        assert!(acc.finish(0).unwrap().arguments.is_empty());
    }

    #[test]
    fn empty_buffer_yields_empty_map() {
        let mut acc = ToolCallAccumulator::new();
        acc.start(2, "call_a".to_owned(), "ping".to_owned());

        assert!(acc.finish(2).unwrap().arguments.is_empty());
    }

    #[test]
    fn fragments_without_start_are_dropped() {
        let mut acc = ToolCallAccumulator::new();
        acc.append(5, r#"{"orphan":true}"#);

        assert!(acc.finish(5).is_none());
    }

    #[test]
    fn finish_removes_the_entry() {
        let mut acc = ToolCallAccumulator::new();
        acc.start(0, "call_1".to_owned(), "list_dir".to_owned());
        acc.append(0, "{}");

        assert!(acc.finish(0).is_some());
        assert!(acc.finish(0).is_none());
    }

    #[test]
    fn finish_all_preserves_index_order() {
        let mut acc = ToolCallAccumulator::new();
        acc.start(1, "call_b".to_owned(), "second".to_owned());
        acc.start(0, "call_a".to_owned(), "first".to_owned());
        acc.append(0, r#"{"n":1}"#);
        acc.append(1, r#"{"n":2}"#);

        let calls = acc.finish_all();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[1].id, "call_b");
        assert!(acc.finish_all().is_empty());
    }

    #[test]
    fn preserves_argument_key_order() {
        let mut acc = ToolCallAccumulator::new();
        acc.start(0, "call_1".to_owned(), "edit".to_owned());
        acc.append(0, r#"{"zebra":1,"apple":2,"mango":3}"#);

        let call = acc.finish(0).unwrap();
        let keys: Vec<&String> = call.arguments.keys().collect();
        assert_eq!(keys, ["zebra", "apple", "mango"]);
    }
}
