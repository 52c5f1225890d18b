//! Conversion between canonical types and the Google Gemini wire format

use crate::accumulator::ToolCallAccumulator;
use crate::protocol::google::{
    GoogleContent, GoogleFunctionCall, GoogleFunctionDeclaration, GoogleFunctionResponse, GoogleGenerationConfig,
    GooglePart, GoogleRequest, GoogleResponse, GoogleTool,
};
use crate::types::{ChatMessage, ChatRequest, Completion, Role, StreamEvent, TokenUsage};

use super::parse_stop_reason;

/// Build a `generateContent` request body; streaming and one-shot share it
pub fn build_request(request: &ChatRequest) -> GoogleRequest {
    let mut system_instruction = request.system.as_ref().map(|system| GoogleContent {
        role: None,
        parts: vec![GooglePart::Text(system.clone())],
    });
    let mut contents = Vec::with_capacity(request.messages.len());

    for message in &request.messages {
        match message.role {
            Role::System => {
                system_instruction = Some(GoogleContent {
                    role: None,
                    parts: vec![GooglePart::Text(message.content.clone())],
                });
            }
            Role::User => contents.push(message_to_google(message, "user")),
            Role::Assistant => contents.push(message_to_google(message, "model")),
            Role::Tool => {
                if let Some(tool_call_id) = &message.tool_call_id {
                    // Tool output that is not JSON gets wrapped so the wire
                    // value is always an object
                    let response = serde_json::from_str(&message.content)
                        .unwrap_or_else(|_| serde_json::json!({"result": message.content}));
                    contents.push(GoogleContent {
                        role: Some("function".to_owned()),
                        parts: vec![GooglePart::FunctionResponse(GoogleFunctionResponse {
                            name: tool_call_id.clone(),
                            response,
                        })],
                    });
                }
            }
        }
    }

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(vec![GoogleTool {
            function_declarations: request
                .tools
                .iter()
                .map(|schema| GoogleFunctionDeclaration {
                    name: schema.name.clone(),
                    description: Some(schema.description.clone()),
                    parameters: Some(schema.parameters_schema()),
                })
                .collect(),
        }])
    };

    GoogleRequest {
        contents,
        system_instruction,
        generation_config: Some(GoogleGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: Some(request.max_tokens),
        }),
        tools,
    }
}

/// Convert a canonical user/assistant message to a Google content object
fn message_to_google(message: &ChatMessage, role: &str) -> GoogleContent {
    let mut parts = Vec::new();

    if !message.content.is_empty() {
        parts.push(GooglePart::Text(message.content.clone()));
    }

    if let Some(tool_calls) = &message.tool_calls {
        for call in tool_calls {
            let args = serde_json::from_str(&call.function.arguments).unwrap_or_else(|_| serde_json::json!({}));
            parts.push(GooglePart::FunctionCall(GoogleFunctionCall {
                name: call.function.name.clone(),
                args,
            }));
        }
    }

    if parts.is_empty() {
        parts.push(GooglePart::Text(String::new()));
    }

    GoogleContent {
        role: Some(role.to_owned()),
        parts,
    }
}

/// Extract a one-shot completion from the non-streaming response shape
pub fn completion_from_response(response: GoogleResponse) -> Completion {
    let mut text = String::new();
    if let Some(candidate) = response.candidates.into_iter().next() {
        for part in candidate.content.parts {
            if let GooglePart::Text(fragment) = part {
                text.push_str(&fragment);
            }
        }
    }

    let usage = response.usage_metadata.map(|usage| TokenUsage {
        prompt_tokens: usage.prompt_token_count,
        completion_tokens: usage.candidates_token_count,
    });

    Completion { text, usage }
}

/// Stateful normalizer for the Google streaming format
///
/// The wire has no partial tool-call concept and no call index; a function
/// call arrives whole inside a candidate part. To keep the event contract
/// uniform, each call is assigned an ordinal id and synthesized as a
/// start / whole-JSON delta / complete triple.
#[derive(Debug, Default)]
pub struct GoogleStreamState {
    calls: ToolCallAccumulator,
    next_ordinal: u32,
}

impl GoogleStreamState {
    /// Create a fresh per-request state
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one candidate/usage snapshot into canonical events
    pub fn convert_chunk(&mut self, chunk: &GoogleResponse) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        for candidate in &chunk.candidates {
            for part in &candidate.content.parts {
                match part {
                    GooglePart::Text(text) => {
                        if !text.is_empty() {
                            events.push(StreamEvent::TextDelta(text.clone()));
                        }
                    }
                    GooglePart::FunctionCall(call) => {
                        let ordinal = self.next_ordinal;
                        self.next_ordinal += 1;

                        let id = format!("google_call_{ordinal}");
                        let arguments = serde_json::to_string(&call.args).unwrap_or_else(|_| "{}".to_owned());

                        self.calls.start(ordinal, id.clone(), call.name.clone());
                        events.push(StreamEvent::ToolCallStart {
                            id: id.clone(),
                            name: call.name.clone(),
                        });

                        self.calls.append(ordinal, &arguments);
                        events.push(StreamEvent::ToolCallArgumentDelta {
                            id,
                            fragment: arguments,
                        });

                        if let Some(parsed) = self.calls.finish(ordinal) {
                            events.push(StreamEvent::ToolCallComplete(parsed));
                        }
                    }
                    GooglePart::FunctionResponse(_) => {}
                }
            }

            if let Some(stop) = candidate.finish_reason.as_deref().and_then(parse_stop_reason) {
                events.push(StreamEvent::Stop(stop));
            }
        }

        if let Some(usage) = &chunk.usage_metadata {
            events.push(StreamEvent::Usage(TokenUsage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
            }));
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StopReason;

    fn chunk(data: &str) -> GoogleResponse {
        serde_json::from_str(data).unwrap()
    }

    #[test]
    fn system_prompt_becomes_system_instruction() {
        let mut request = ChatRequest::new("gemini-2.0-flash", vec![ChatMessage::user("hello")], 512);
        request.system = Some("Reply tersely".to_owned());

        let body = build_request(&request);
        let parts = &body.system_instruction.unwrap().parts;
        assert!(matches!(&parts[0], GooglePart::Text(text) if text == "Reply tersely"));
        assert_eq!(body.generation_config.unwrap().max_output_tokens, Some(512));
    }

    #[test]
    fn assistant_role_remaps_to_model() {
        let request = ChatRequest::new(
            "gemini-2.0-flash",
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            256,
        );

        let body = build_request(&request);
        assert_eq!(body.contents[0].role.as_deref(), Some("user"));
        assert_eq!(body.contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn tool_result_becomes_function_role() {
        let request = ChatRequest::new(
            "gemini-2.0-flash",
            vec![ChatMessage::tool_result("list_dir", r#"{"entries":["a.txt"]}"#)],
            256,
        );

        let body = build_request(&request);
        assert_eq!(body.contents[0].role.as_deref(), Some("function"));
        match &body.contents[0].parts[0] {
            GooglePart::FunctionResponse(resp) => {
                assert_eq!(resp.name, "list_dir");
                assert_eq!(resp.response["entries"][0], "a.txt");
            }
            other => panic!("wrong part: {other:?}"),
        }
    }

    #[test]
    fn tools_wrapped_in_function_declarations() {
        let mut request = ChatRequest::new("gemini-2.0-flash", vec![ChatMessage::user("hi")], 256);
        request.tools = vec![crate::types::ToolSchema::new("list_dir", "List directory contents")];

        let body = build_request(&request);
        let tools = body.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function_declarations[0].name, "list_dir");
    }

    #[test]
    fn function_call_synthesizes_canonical_triple() {
        let mut state = GoogleStreamState::new();
        let events = state.convert_chunk(&chunk(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"functionCall":{"name":"list_dir","args":{"path":"/tmp"}}}]}}]}"#,
        ));

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            StreamEvent::ToolCallStart {
                id: "google_call_0".to_owned(),
                name: "list_dir".to_owned()
            }
        );
        assert_eq!(
            events[1],
            StreamEvent::ToolCallArgumentDelta {
                id: "google_call_0".to_owned(),
                fragment: r#"{"path":"/tmp"}"#.to_owned(),
            }
        );
        match &events[2] {
            StreamEvent::ToolCallComplete(call) => {
                assert_eq!(call.id, "google_call_0");
                assert_eq!(call.name, "list_dir");
                assert_eq!(call.arguments["path"], "/tmp");
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn ordinals_advance_per_call() {
        let mut state = GoogleStreamState::new();
        state.convert_chunk(&chunk(
            r#"{"candidates":[{"content":{"parts":[{"functionCall":{"name":"first","args":{}}}]}}]}"#,
        ));
        let events = state.convert_chunk(&chunk(
            r#"{"candidates":[{"content":{"parts":[{"functionCall":{"name":"second","args":{}}}]}}]}"#,
        ));

        assert!(matches!(&events[0], StreamEvent::ToolCallStart { id, .. } if id == "google_call_1"));
    }

    #[test]
    fn finish_reason_and_usage_map() {
        let mut state = GoogleStreamState::new();
        let events = state.convert_chunk(&chunk(
            r#"{"candidates":[{"content":{"parts":[{"text":"done"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":20,"candidatesTokenCount":6,"totalTokenCount":26}}"#,
        ));

        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta("done".to_owned()),
                StreamEvent::Stop(StopReason::Stop),
                StreamEvent::Usage(TokenUsage {
                    prompt_tokens: 20,
                    completion_tokens: 6
                }),
            ]
        );
    }

    #[test]
    fn oneshot_extracts_first_candidate_text() {
        let completion = completion_from_response(chunk(
            r#"{"candidates":[{"content":{"parts":[{"text":"pwd"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":5,"candidatesTokenCount":2,"totalTokenCount":7}}"#,
        ));

        assert_eq!(completion.text, "pwd");
        assert_eq!(completion.usage.unwrap().completion_tokens, 2);
    }
}
