//! Conversion between canonical types and the OpenAI wire format

use crate::accumulator::ToolCallAccumulator;
use crate::protocol::openai::{
    OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk,
    OpenAiStreamOptions, OpenAiTool, OpenAiToolCall,
};
use crate::types::{ChatMessage, ChatRequest, Completion, ReasoningEffort, Role, StreamEvent, TokenUsage, ToolSchema};

use super::parse_stop_reason;

/// Build a chat-completions request body
///
/// `include_usage_options` distinguishes the cloud variant (which asks for
/// the final usage chunk) from local servers, several of which reject the
/// `stream_options` parameter.
pub fn build_request(request: &ChatRequest, stream: bool, include_usage_options: bool) -> OpenAiRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
        messages.push(OpenAiMessage {
            role: "system".to_owned(),
            content: Some(system.clone()),
            tool_calls: None,
            tool_call_id: None,
        });
    }
    messages.extend(request.messages.iter().map(message_to_openai));

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(request.tools.iter().map(tool_to_openai).collect())
    };
    let tool_choice = tools.as_ref().map(|_| "auto".to_owned());

    // Reasoning models reject sampled temperatures and use a different
    // token-ceiling field
    let (temperature, max_tokens, max_completion_tokens, reasoning_effort) = match &request.reasoning {
        Some(reasoning) => {
            let effort = (reasoning.effort != ReasoningEffort::None).then(|| reasoning.effort.as_str().to_owned());
            (Some(1.0), None, Some(request.max_tokens), effort)
        }
        None => (request.temperature, Some(request.max_tokens), None, None),
    };

    OpenAiRequest {
        model: request.model.clone(),
        messages,
        temperature,
        max_tokens,
        max_completion_tokens,
        reasoning_effort,
        stream: stream.then_some(true),
        tools,
        tool_choice,
        stream_options: (stream && include_usage_options).then_some(OpenAiStreamOptions { include_usage: true }),
    }
}

/// Convert a canonical message to the OpenAI shape
fn message_to_openai(message: &ChatMessage) -> OpenAiMessage {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let tool_calls = message.tool_calls.as_ref().map(|calls| {
        calls
            .iter()
            .map(|call| OpenAiToolCall {
                id: call.id.clone(),
                tool_type: "function".to_owned(),
                function: OpenAiFunctionCall {
                    name: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                },
            })
            .collect()
    });

    OpenAiMessage {
        role: role.to_owned(),
        content: Some(message.content.clone()),
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

/// Convert a tool schema to the OpenAI declaration shape
fn tool_to_openai(schema: &ToolSchema) -> OpenAiTool {
    OpenAiTool {
        tool_type: "function".to_owned(),
        function: OpenAiFunction {
            name: schema.name.clone(),
            description: Some(schema.description.clone()),
            parameters: Some(schema.parameters_schema()),
        },
    }
}

/// Extract a one-shot completion from the non-streaming response shape
pub fn completion_from_response(response: OpenAiResponse) -> Completion {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    let usage = response.usage.map(|usage| TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    });

    Completion { text, usage }
}

/// Stateful normalizer for the OpenAI streaming format
///
/// Tool-call arguments arrive as fragments keyed by `tool_calls[].index`;
/// there is no per-call closing event, so pending calls are flushed to
/// completions when `finish_reason` arrives. Calls still pending when the
/// stream ends without a finish signal are dropped.
#[derive(Debug, Default)]
pub struct OpenAiStreamState {
    calls: ToolCallAccumulator,
}

impl OpenAiStreamState {
    /// Create a fresh per-request state
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one stream chunk into canonical events, preserving order
    pub fn convert_chunk(&mut self, chunk: &OpenAiStreamChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        for choice in &chunk.choices {
            if let Some(content) = &choice.delta.content
                && !content.is_empty()
            {
                events.push(StreamEvent::TextDelta(content.clone()));
            }

            if let Some(tool_calls) = &choice.delta.tool_calls {
                for call in tool_calls {
                    if let Some(id) = &call.id {
                        let name = call
                            .function
                            .as_ref()
                            .and_then(|f| f.name.clone())
                            .unwrap_or_default();
                        self.calls.start(call.index, id.clone(), name.clone());
                        events.push(StreamEvent::ToolCallStart { id: id.clone(), name });
                    }

                    // An argument fragment may ride on the start chunk or
                    // arrive alone on a later one
                    if let Some(fragment) = call.function.as_ref().and_then(|f| f.arguments.as_ref())
                        && !fragment.is_empty()
                        && let Some(id) = self.calls.id_for(call.index).map(str::to_owned)
                    {
                        self.calls.append(call.index, fragment);
                        events.push(StreamEvent::ToolCallArgumentDelta {
                            id,
                            fragment: fragment.clone(),
                        });
                    }
                }
            }

            if let Some(reason) = &choice.finish_reason {
                events.extend(self.calls.finish_all().into_iter().map(StreamEvent::ToolCallComplete));
                if let Some(stop) = parse_stop_reason(reason) {
                    events.push(StreamEvent::Stop(stop));
                }
            }
        }

        if let Some(usage) = &chunk.usage {
            events.push(StreamEvent::Usage(TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            }));
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParameterKind, StopReason, ToolParameter};

    fn request_with_tools() -> ChatRequest {
        let mut request = ChatRequest::new("gpt-4o", vec![ChatMessage::user("hello")], 1024);
        request.system = Some("You are a terminal assistant".to_owned());
        request.tools = vec![ToolSchema::new("list_dir", "List directory contents").with_parameter(ToolParameter {
            name: "path".to_owned(),
            kind: ParameterKind::String,
            description: "Directory to list".to_owned(),
            required: true,
            enum_values: None,
        })];
        request
    }

    fn chunk(data: &str) -> OpenAiStreamChunk {
        serde_json::from_str(data).unwrap()
    }

    #[test]
    fn builds_standard_request() {
        let body = build_request(&request_with_tools(), true, true);

        assert_eq!(body.model, "gpt-4o");
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].role, "user");
        assert_eq!(body.max_tokens, Some(1024));
        assert!(body.max_completion_tokens.is_none());
        assert_eq!(body.tool_choice.as_deref(), Some("auto"));
        assert_eq!(body.stream, Some(true));
        assert!(body.stream_options.as_ref().is_some_and(|o| o.include_usage));

        let tools = body.tools.unwrap();
        assert_eq!(tools[0].function.name, "list_dir");
        assert_eq!(tools[0].function.parameters.as_ref().unwrap()["type"], "object");
    }

    #[test]
    fn reasoning_forces_temperature_and_completion_ceiling() {
        let mut request = request_with_tools();
        request.temperature = Some(0.2);
        request.reasoning = Some(crate::types::ReasoningOptions {
            effort: ReasoningEffort::High,
            budget_tokens: 0,
        });

        let body = build_request(&request, false, false);
        assert_eq!(body.temperature, Some(1.0));
        assert!(body.max_tokens.is_none());
        assert_eq!(body.max_completion_tokens, Some(1024));
        assert_eq!(body.reasoning_effort.as_deref(), Some("high"));
    }

    #[test]
    fn none_effort_omits_reasoning_effort() {
        let mut request = request_with_tools();
        request.reasoning = Some(crate::types::ReasoningOptions {
            effort: ReasoningEffort::None,
            budget_tokens: 0,
        });

        let body = build_request(&request, false, false);
        assert!(body.reasoning_effort.is_none());
        assert_eq!(body.max_completion_tokens, Some(1024));
    }

    #[test]
    fn empty_tools_are_omitted() {
        let request = ChatRequest::new("gpt-4o", vec![ChatMessage::user("hi")], 64);
        let body = build_request(&request, true, false);
        assert!(body.tools.is_none());
        assert!(body.tool_choice.is_none());
        assert!(body.stream_options.is_none());
    }

    #[test]
    fn tool_result_message_carries_call_id() {
        let request = ChatRequest::new(
            "gpt-4o",
            vec![ChatMessage::tool_result("call_9", "drwxr-xr-x logs")],
            64,
        );
        let body = build_request(&request, false, false);
        assert_eq!(body.messages[0].role, "tool");
        assert_eq!(body.messages[0].tool_call_id.as_deref(), Some("call_9"));
    }

    #[test]
    fn text_deltas_preserve_order() {
        let mut state = OpenAiStreamState::new();
        let mut events = Vec::new();
        for text in ["Hel", "lo ", "world"] {
            let data = format!(r#"{{"choices":[{{"index":0,"delta":{{"content":"{text}"}}}}]}}"#);
            events.extend(state.convert_chunk(&chunk(&data)));
        }

        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta("Hel".to_owned()),
                StreamEvent::TextDelta("lo ".to_owned()),
                StreamEvent::TextDelta("world".to_owned()),
            ]
        );
    }

    #[test]
    fn fragmented_tool_call_completes_on_finish_reason() {
        let mut state = OpenAiStreamState::new();
        let mut events = Vec::new();

        events.extend(state.convert_chunk(&chunk(
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"list_dir","arguments":""}}]}}]}"#,
        )));
        events.extend(state.convert_chunk(&chunk(
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"path\":"}}]}}]}"#,
        )));
        events.extend(state.convert_chunk(&chunk(
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"/tmp\"}"}}]}}]}"#,
        )));
        events.extend(state.convert_chunk(&chunk(
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#,
        )));

        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0],
            StreamEvent::ToolCallStart {
                id: "call_1".to_owned(),
                name: "list_dir".to_owned()
            }
        );
        assert!(matches!(&events[1], StreamEvent::ToolCallArgumentDelta { id, .. } if id == "call_1"));
        assert!(matches!(&events[2], StreamEvent::ToolCallArgumentDelta { .. }));
        match &events[3] {
            StreamEvent::ToolCallComplete(call) => {
                assert_eq!(call.id, "call_1");
                assert_eq!(call.arguments["path"], "/tmp");
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(events[4], StreamEvent::Stop(StopReason::ToolUse));
    }

    #[test]
    fn call_without_finish_reason_never_completes() {
        let mut state = OpenAiStreamState::new();
        let mut events = Vec::new();

        events.extend(state.convert_chunk(&chunk(
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"list_dir"}}]}}]}"#,
        )));
        events.extend(state.convert_chunk(&chunk(
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"pa"}}]}}]}"#,
        )));

        assert!(!events.iter().any(|e| matches!(e, StreamEvent::ToolCallComplete(_))));
    }

    #[test]
    fn parallel_calls_flush_in_index_order() {
        let mut state = OpenAiStreamState::new();

        state.convert_chunk(&chunk(
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_a","function":{"name":"first","arguments":"{}"}},{"index":1,"id":"call_b","function":{"name":"second","arguments":"{}"}}]}}]}"#,
        ));
        let events = state.convert_chunk(&chunk(r#"{"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#));

        let completed: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::ToolCallComplete(call) => Some(call.id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(completed, ["call_a", "call_b"]);
    }

    #[test]
    fn usage_chunk_becomes_usage_event() {
        let mut state = OpenAiStreamState::new();
        let events = state.convert_chunk(&chunk(
            r#"{"choices":[],"usage":{"prompt_tokens":100,"completion_tokens":42,"total_tokens":142}}"#,
        ));

        assert_eq!(
            events,
            vec![StreamEvent::Usage(TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 42
            })]
        );
    }

    #[test]
    fn oneshot_extracts_text_and_usage() {
        let response: OpenAiResponse = serde_json::from_str(
            r#"{"id":"c1","choices":[{"index":0,"message":{"role":"assistant","content":"ls -la"},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":4,"total_tokens":16}}"#,
        )
        .unwrap();

        let completion = completion_from_response(response);
        assert_eq!(completion.text, "ls -la");
        assert_eq!(completion.usage.unwrap().completion_tokens, 4);
    }
}
