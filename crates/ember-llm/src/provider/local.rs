//! Local OpenAI-compatible server provider
//!
//! Speaks the same wire format as the cloud provider but sends no
//! `Authorization` header and never sends `stream_options`, which several
//! local servers reject.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::openai::openai_event_stream;
use super::{EventStream, Provider, fail_on_status, finalize_events};
use crate::convert::openai::{build_request, completion_from_response};
use crate::error::LlmError;
use crate::protocol::openai::{self, OpenAiResponse};
use crate::types::{ChatRequest, Completion};

/// Local OpenAI-compatible provider
pub struct LocalProvider {
    client: Client,
    base_url: Url,
}

impl LocalProvider {
    /// Create a provider over a shared HTTP client
    pub const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    fn request_builder(&self, request: &ChatRequest, body: &impl serde::Serialize) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(self.completions_url()).json(body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion, LlmError> {
        let body = build_request(request, false, false);

        let response = self.request_builder(request, &body).send().await.map_err(|e| {
            tracing::error!(provider = self.name(), error = %e, "local request failed");
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
        let body = build_request(request, true, false);

        let response = self.request_builder(request, &body).send().await.map_err(|e| {
            tracing::error!(provider = self.name(), error = %e, "local stream request failed");
            LlmError::Transport(e.to_string())
        })?;
        let response = fail_on_status(self.name(), response, openai::error_message).await?;

        Ok(Box::pin(finalize_events(openai_event_stream(response))))
    }
}
