//! Anthropic Messages API provider implementation

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{EventStream, Provider, fail_on_status, finalize_events};
use crate::convert::anthropic::{AnthropicStreamState, build_request, completion_from_response};
use crate::error::LlmError;
use crate::protocol::anthropic::{self, AnthropicResponse, AnthropicStreamEvent};
use crate::types::{ChatRequest, Completion, StreamEvent};

/// Default Anthropic API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Beta feature header required for extended thinking
const THINKING_BETA: &str = "interleaved-thinking-2025-05-14";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl AnthropicProvider {
    /// Create a provider over a shared HTTP client
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (never happens).
    pub fn new(client: Client, api_key: SecretString, base_url: Option<Url>) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL")),
            api_key,
        }
    }

    /// Build the messages endpoint URL
    fn messages_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/messages")
    }

    fn request_builder(&self, request: &ChatRequest, body: &impl serde::Serialize) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body);
        if request.reasoning.is_some() {
            builder = builder.header("anthropic-beta", THINKING_BETA);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion, LlmError> {
        let body = build_request(request, false);

        let response = self.request_builder(request, &body).send().await.map_err(|e| {
            tracing::error!(provider = self.name(), error = %e, "upstream request failed");
            LlmError::Transport(e.to_string())
        })?;
        let response = fail_on_status(self.name(), response, anthropic::error_message).await?;

        let wire: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(completion_from_response(wire))
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<EventStream, LlmError> {
        let body = build_request(request, true);

        let response = self.request_builder(request, &body).send().await.map_err(|e| {
            tracing::error!(provider = self.name(), error = %e, "upstream stream request failed");
            LlmError::Transport(e.to_string())
        })?;
        let response = fail_on_status(self.name(), response, anthropic::error_message).await?;

        let mut state = AnthropicStreamState::new();
        let events = response
            .bytes_stream()
            .eventsource()
            .map(move |result| match result {
                Ok(event) => {
                    let data = event.data.trim();
                    match serde_json::from_str::<AnthropicStreamEvent>(data) {
                        Ok(stream_event) => state.convert_event(&stream_event).into_iter().map(Ok).collect(),
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparseable Anthropic SSE event");
                            Vec::new()
                        }
                    }
                }
                Err(e) => vec![Err(LlmError::Stream(e.to_string()))],
            })
            .flat_map(futures_util::stream::iter);

        Ok(Box::pin(finalize_events(events)))
    }
}
