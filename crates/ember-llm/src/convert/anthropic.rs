//! Conversion between canonical types and the Anthropic Messages wire format

use crate::accumulator::ToolCallAccumulator;
use crate::protocol::anthropic::{
    AnthropicContent, AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse,
    AnthropicResponseBlock, AnthropicStreamContentBlock, AnthropicStreamDelta, AnthropicStreamEvent, AnthropicThinking,
    AnthropicTool,
};
use crate::types::{ChatMessage, ChatRequest, Completion, Role, StreamEvent, TokenUsage, ToolSchema};

use super::parse_stop_reason;

/// Headroom added on top of the thinking budget
///
/// Anthropic's thinking budget competes with `max_tokens`; without this
/// compensation a large budget silently truncates the visible answer.
const THINKING_HEADROOM_TOKENS: u32 = 1000;

/// Build a Messages API request body
pub fn build_request(request: &ChatRequest, stream: bool) -> AnthropicRequest {
    let mut system = request.system.clone();
    let mut messages = Vec::with_capacity(request.messages.len());

    for message in &request.messages {
        // System turns have no message-level representation; the last one wins
        if message.role == Role::System {
            system = Some(message.content.clone());
        } else {
            messages.push(message_to_anthropic(message));
        }
    }

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(request.tools.iter().map(tool_to_anthropic).collect())
    };

    let (max_tokens, temperature, thinking) = match &request.reasoning {
        Some(reasoning) => (
            request.max_tokens.max(reasoning.budget_tokens + THINKING_HEADROOM_TOKENS),
            // Thinking-enabled requests reject explicit temperatures
            None,
            Some(AnthropicThinking::enabled(reasoning.budget_tokens)),
        ),
        None => (request.max_tokens, request.temperature, None),
    };

    AnthropicRequest {
        model: request.model.clone(),
        max_tokens,
        system,
        messages,
        temperature,
        stream: stream.then_some(true),
        tools,
        thinking,
    }
}

/// Convert a canonical message to the Anthropic shape
fn message_to_anthropic(message: &ChatMessage) -> AnthropicMessage {
    // Tool results are user turns carrying a tool_result block
    if message.role == Role::Tool
        && let Some(tool_call_id) = &message.tool_call_id
    {
        return AnthropicMessage {
            role: "user".to_owned(),
            content: AnthropicContent::Blocks(vec![AnthropicContentBlock::ToolResult {
                tool_use_id: tool_call_id.clone(),
                content: message.content.clone(),
            }]),
        };
    }

    // Assistant turns with prior tool calls become block arrays
    if let Some(tool_calls) = &message.tool_calls {
        let mut blocks = Vec::new();
        if !message.content.is_empty() {
            blocks.push(AnthropicContentBlock::Text {
                text: message.content.clone(),
            });
        }
        for call in tool_calls {
            let input = serde_json::from_str(&call.function.arguments).unwrap_or_else(|_| serde_json::json!({}));
            blocks.push(AnthropicContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.function.name.clone(),
                input,
            });
        }

        return AnthropicMessage {
            role: "assistant".to_owned(),
            content: AnthropicContent::Blocks(blocks),
        };
    }

    let role = match message.role {
        Role::Assistant => "assistant",
        Role::User | Role::Tool | Role::System => "user",
    };

    AnthropicMessage {
        role: role.to_owned(),
        content: AnthropicContent::Text(message.content.clone()),
    }
}

/// Convert a tool schema to the Anthropic declaration shape
fn tool_to_anthropic(schema: &ToolSchema) -> AnthropicTool {
    AnthropicTool {
        name: schema.name.clone(),
        description: Some(schema.description.clone()),
        input_schema: schema.parameters_schema(),
    }
}

/// Extract a one-shot completion from the non-streaming response shape
pub fn completion_from_response(response: AnthropicResponse) -> Completion {
    let mut text = String::new();
    for block in response.content {
        if let AnthropicResponseBlock::Text { text: fragment } = block {
            text.push_str(&fragment);
        }
    }

    let usage = response.usage.map(|usage| TokenUsage {
        prompt_tokens: usage.input_tokens,
        completion_tokens: usage.output_tokens,
    });

    Completion { text, usage }
}

/// Stateful normalizer for the Anthropic streaming format
///
/// A `content_block_start`/`content_block_stop` pair bounds one tool call's
/// lifetime; only `tool_use` blocks accumulate. Usage arrives progressively
/// (prompt side at `message_start`, completion side at `message_delta`) and
/// each sighting is emitted as its own event for the consumer to sum.
#[derive(Debug, Default)]
pub struct AnthropicStreamState {
    calls: ToolCallAccumulator,
}

impl AnthropicStreamState {
    /// Create a fresh per-request state
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one typed envelope into canonical events, preserving order
    pub fn convert_event(&mut self, event: &AnthropicStreamEvent) -> Vec<StreamEvent> {
        match event {
            AnthropicStreamEvent::MessageStart { message } => message
                .usage
                .map(|usage| {
                    vec![StreamEvent::Usage(TokenUsage {
                        prompt_tokens: usage.input_tokens,
                        completion_tokens: usage.output_tokens,
                    })]
                })
                .unwrap_or_default(),

            AnthropicStreamEvent::ContentBlockStart { index, content_block } => match content_block {
                AnthropicStreamContentBlock::ToolUse { id, name, .. } => {
                    self.calls.start(*index, id.clone(), name.clone());
                    vec![StreamEvent::ToolCallStart {
                        id: id.clone(),
                        name: name.clone(),
                    }]
                }
                AnthropicStreamContentBlock::Text { text } if !text.is_empty() => {
                    vec![StreamEvent::TextDelta(text.clone())]
                }
                AnthropicStreamContentBlock::Text { .. } | AnthropicStreamContentBlock::Thinking { .. } => Vec::new(),
            },

            AnthropicStreamEvent::ContentBlockDelta { index, delta } => match delta {
                AnthropicStreamDelta::TextDelta { text } => vec![StreamEvent::TextDelta(text.clone())],
                AnthropicStreamDelta::InputJsonDelta { partial_json } => {
                    let Some(id) = self.calls.id_for(*index).map(str::to_owned) else {
                        // Fragment for a block that never started as tool_use
                        return Vec::new();
                    };
                    self.calls.append(*index, partial_json);
                    vec![StreamEvent::ToolCallArgumentDelta {
                        id,
                        fragment: partial_json.clone(),
                    }]
                }
                AnthropicStreamDelta::ThinkingDelta { .. } => Vec::new(),
            },

            AnthropicStreamEvent::ContentBlockStop { index } => self
                .calls
                .finish(*index)
                .map(|call| vec![StreamEvent::ToolCallComplete(call)])
                .unwrap_or_default(),

            AnthropicStreamEvent::MessageDelta { delta, usage } => {
                let mut events = Vec::new();
                if let Some(stop) = delta.stop_reason.as_deref().and_then(parse_stop_reason) {
                    events.push(StreamEvent::Stop(stop));
                }
                if let Some(usage) = usage {
                    events.push(StreamEvent::Usage(TokenUsage {
                        prompt_tokens: usage.input_tokens,
                        completion_tokens: usage.output_tokens,
                    }));
                }
                events
            }

            AnthropicStreamEvent::MessageStop => vec![StreamEvent::Done],

            AnthropicStreamEvent::Ping => Vec::new(),
        }
    }
}
