//! Google Gemini API provider implementation

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{EventStream, Provider, fail_on_status, finalize_events};
use crate::convert::google::{GoogleStreamState, build_request, completion_from_response};
use crate::error::LlmError;
use crate::protocol::google::{self, GoogleResponse};
use crate::types::{ChatRequest, Completion};

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini API provider
pub struct GoogleProvider {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl GoogleProvider {
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

    /// Build the one-shot `generateContent` endpoint URL
    fn generate_url(&self, model: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{model}:generateContent")
    }

    /// Build the streaming `streamGenerateContent` endpoint URL
    fn stream_url(&self, model: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{model}:streamGenerateContent?alt=sse")
    }

    fn request_builder(
        &self,
        url: String,
        request: &ChatRequest,
        body: &impl serde::Serialize,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion, LlmError> {
        let body = build_request(request);
        let url = self.generate_url(&request.model);

        let response = self.request_builder(url, request, &body).send().await.map_err(|e| {
            tracing::error!(provider = self.name(), error = %e, "upstream request failed");
            LlmError::Transport(e.to_string())
        })?;
        let response = fail_on_status(self.name(), response, google::error_message).await?;

        let wire: GoogleResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(completion_from_response(wire))
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<EventStream, LlmError> {
        let body = build_request(request);
        let url = self.stream_url(&request.model);

        let response = self.request_builder(url, request, &body).send().await.map_err(|e| {
            tracing::error!(provider = self.name(), error = %e, "upstream stream request failed");
            LlmError::Transport(e.to_string())
        })?;
        let response = fail_on_status(self.name(), response, google::error_message).await?;

        // No wire end sentinel; the finalizer appends Done at exhaustion
        let mut state = GoogleStreamState::new();
        let events = response
            .bytes_stream()
            .eventsource()
            .map(move |result| match result {
                Ok(event) => {
                    let data = event.data.trim();
                    match serde_json::from_str::<GoogleResponse>(data) {
                        Ok(chunk) => state.convert_chunk(&chunk).into_iter().map(Ok).collect(),
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparseable Google SSE chunk");
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
