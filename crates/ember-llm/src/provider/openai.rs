//! OpenAI cloud provider implementation

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{EventStream, Provider, fail_on_status, finalize_events};
use crate::convert::openai::{OpenAiStreamState, build_request, completion_from_response};
use crate::error::LlmError;
use crate::protocol::openai::{self, OpenAiResponse, OpenAiStreamChunk};
use crate::types::{ChatRequest, Completion, StreamEvent};

/// Default OpenAI API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI cloud provider
pub struct OpenAiProvider {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl OpenAiProvider {
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

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    fn request_builder(&self, request: &ChatRequest, body: &impl serde::Serialize) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion, LlmError> {
        let body = build_request(request, false, false);

        let response = self.request_builder(request, &body).send().await.map_err(|e| {
            tracing::error!(provider = self.name(), error = %e, "upstream request failed");
            LlmError::Transport(e.to_string())
        })?;
        let response = fail_on_status(self.name(), response, openai::error_message).await?;

        let wire: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(completion_from_response(wire))
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<EventStream, LlmError> {
        let body = build_request(request, true, true);

        let response = self.request_builder(request, &body).send().await.map_err(|e| {
            tracing::error!(provider = self.name(), error = %e, "upstream stream request failed");
            LlmError::Transport(e.to_string())
        })?;
        let response = fail_on_status(self.name(), response, openai::error_message).await?;

        Ok(Box::pin(finalize_events(openai_event_stream(response))))
    }
}

/// Decode an OpenAI-format SSE body into canonical events
///
/// Shared with the local provider, which speaks the same wire format.
pub(super) fn openai_event_stream(
    response: reqwest::Response,
) -> impl futures_util::Stream<Item = Result<StreamEvent, LlmError>> {
    let mut state = OpenAiStreamState::new();

    response
        .bytes_stream()
        .eventsource()
        .map(move |result| match result {
            Ok(event) => {
                let data = event.data.trim();
                if data == "[DONE]" {
                    return vec![Ok(StreamEvent::Done)];
                }
                match serde_json::from_str::<OpenAiStreamChunk>(data) {
                    Ok(chunk) => state.convert_chunk(&chunk).into_iter().map(Ok).collect(),
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping unparseable SSE chunk");
                        Vec::new()
                    }
                }
            }
            Err(e) => vec![Err(LlmError::Stream(e.to_string()))],
        })
        .flat_map(futures_util::stream::iter)
}
