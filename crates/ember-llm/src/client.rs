//! Unified client façade over all backends
//!
//! Consumers hand it a [`ProviderTarget`] and a [`ChatRequest`] and get
//! either the canonical event stream or a buffered one-shot result; no
//! backend-specific type crosses this boundary.

use std::sync::Arc;

use futures_util::StreamExt;
use tiktoken_rs::o200k_base;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::LlmError;
use crate::provider::{EventStream, select_provider};
use crate::types::{ChatRequest, CompletionOutcome, ProviderTarget, StreamEvent, TokenUsage, ToolSupport};
use crate::usage::{RequestKind, UsageRecord, UsageRecorder};

/// Unified LLM client
///
/// Cheap to clone; completions run as independent futures and may overlap
/// freely. The HTTP client is shared (connection pooling is its concern)
/// and never reconfigured per request.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    usage: Arc<dyn UsageRecorder>,
}

impl LlmClient {
    /// Create a client with its own HTTP transport
    pub fn new(usage: Arc<dyn UsageRecorder>) -> Self {
        Self::with_http_client(reqwest::Client::new(), usage)
    }

    /// Create a client over an existing HTTP transport
    pub fn with_http_client(http: reqwest::Client, usage: Arc<dyn UsageRecorder>) -> Self {
        Self { http, usage }
    }

    /// Streaming completion with tools
    ///
    /// Returns the canonical event sequence. The sequence is pull-based:
    /// response bytes are read only as the consumer polls, and dropping the
    /// stream abandons the response body. Cancellation is checked once
    /// before the network call; after that the consumer cancels by
    /// dropping the stream.
    ///
    /// # Errors
    ///
    /// Fails before any network traffic with [`LlmError::Cancelled`] or
    /// [`LlmError::MissingApiKey`]; otherwise with the transport or API
    /// error that prevented the stream from starting.
    pub async fn stream(
        &self,
        target: &ProviderTarget,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<EventStream, LlmError> {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let provider = select_provider(&self.http, target)?;
        let request_id = Uuid::new_v4();
        tracing::debug!(
            provider = provider.name(),
            model = %request.model,
            %request_id,
            "starting streaming completion"
        );

        let events = provider.complete_stream(request).await?;

        // Tap usage events into the recorder as they pass through; records
        // are independent appends, so partial sightings stay partial
        let recorder = Arc::clone(&self.usage);
        let provider_name = provider.name();
        let model = request.model.clone();
        let tapped = events.inspect(move |item| {
            if let Ok(StreamEvent::Usage(usage)) = item {
                recorder.record(UsageRecord {
                    request_id,
                    provider: provider_name,
                    model: model.clone(),
                    prompt_tokens: usage.prompt_tokens,
                    completion_tokens: usage.completion_tokens,
                    estimated: false,
                    kind: RequestKind::Streaming,
                });
            }
        });

        Ok(Box::pin(tapped))
    }

    /// Buffered one-shot completion
    ///
    /// Issues a non-streaming request and returns the assistant text with
    /// usage accounting. When the backend omits usage, a token estimate
    /// over the request and response text is substituted and flagged.
    ///
    /// # Errors
    ///
    /// Fails with [`LlmError::EmptyResponse`] when the response carries no
    /// text, and with the same pre-flight errors as [`Self::stream`].
    pub async fn complete(
        &self,
        target: &ProviderTarget,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<CompletionOutcome, LlmError> {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let provider = select_provider(&self.http, target)?;
        let request_id = Uuid::new_v4();
        tracing::debug!(
            provider = provider.name(),
            model = %request.model,
            %request_id,
            "starting one-shot completion"
        );

        let completion = provider.complete(request).await?;
        if completion.text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let (usage, estimated) = match completion.usage {
            Some(usage) => (usage, false),
            None => (
                TokenUsage {
                    prompt_tokens: estimate_tokens(&request_text(request)),
                    completion_tokens: estimate_tokens(&completion.text),
                },
                true,
            ),
        };

        self.usage.record(UsageRecord {
            request_id,
            provider: provider.name(),
            model: request.model.clone(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            estimated,
            kind: RequestKind::OneShot,
        });

        Ok(CompletionOutcome {
            content: completion.text,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            estimated,
        })
    }

    /// Probe whether a model supports tool calls
    ///
    /// Deliberately a no-op returning [`ToolSupport::Unknown`]: the system
    /// does not capability-probe and lets a tool-call attempt fail
    /// naturally at runtime.
    #[allow(clippy::unused_self)]
    pub const fn check_tool_support(&self, _model: &str) -> ToolSupport {
        ToolSupport::Unknown
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient").finish_non_exhaustive()
    }
}

/// All prompt-side text of a request, for estimation
fn request_text(request: &ChatRequest) -> String {
    let mut text = request.system.clone().unwrap_or_default();
    for message in &request.messages {
        text.push('\n');
        text.push_str(&message.content);
    }
    text
}

/// Estimate token count when the backend omits usage
fn estimate_tokens(text: &str) -> u32 {
    let count = o200k_base().map_or_else(
        |_| text.len() / 4,
        |bpe| bpe.encode_with_special_tokens(text).len(),
    );
    u32::try_from(count).unwrap_or(u32::MAX)
}
