//! Provider trait and implementations for LLM backends
//!
//! One implementation per backend variant; the façade selects one per call
//! from the [`ProviderTarget`] and never branches on backends elsewhere.

pub mod anthropic;
pub mod google;
pub mod local;
pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, stream};
use secrecy::SecretString;

use crate::error::LlmError;
use crate::types::{ChatRequest, Completion, ProviderTarget, StreamEvent};

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use local::LocalProvider;
pub use openai::OpenAiProvider;

/// Canonical event sequence of one streaming completion
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Trait implemented by each backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable lowercase provider name
    fn name(&self) -> &'static str;

    /// Send a non-streaming completion request
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, LlmError>;

    /// Send a streaming completion request
    async fn complete_stream(&self, request: &ChatRequest) -> Result<EventStream, LlmError>;
}

/// Select the backend implementation for a target
///
/// Cloud targets without an API key fail here, before any network call.
pub fn select_provider(http: &reqwest::Client, target: &ProviderTarget) -> Result<Box<dyn Provider>, LlmError> {
    match target {
        ProviderTarget::OpenAi { api_key, base_url } => {
            let api_key = require_key(api_key, target.provider_name())?;
            Ok(Box::new(OpenAiProvider::new(http.clone(), api_key, base_url.clone())))
        }
        ProviderTarget::Anthropic { api_key, base_url } => {
            let api_key = require_key(api_key, target.provider_name())?;
            Ok(Box::new(AnthropicProvider::new(http.clone(), api_key, base_url.clone())))
        }
        ProviderTarget::Google { api_key, base_url } => {
            let api_key = require_key(api_key, target.provider_name())?;
            Ok(Box::new(GoogleProvider::new(http.clone(), api_key, base_url.clone())))
        }
        ProviderTarget::Local { base_url } => Ok(Box::new(LocalProvider::new(http.clone(), base_url.clone()))),
    }
}

fn require_key(api_key: &Option<SecretString>, provider: &'static str) -> Result<SecretString, LlmError> {
    api_key.clone().ok_or(LlmError::MissingApiKey { provider })
}

/// Fail on a non-2xx status, extracting the provider's diagnostic message
///
/// The body is drained before decoding begins; `extract` parses the
/// backend's error envelope and falls back to the trimmed raw body.
pub(crate) async fn fail_on_status(
    provider: &'static str,
    response: reqwest::Response,
    extract: fn(&str) -> Option<String>,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract(&body).unwrap_or_else(|| body.trim().to_owned());
    tracing::warn!(provider, status = status.as_u16(), "upstream returned error");

    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Uniform tail behavior for every backend's event sequence
///
/// Guarantees `Done` is emitted exactly once: a wire-signaled `Done`
/// (OpenAI `[DONE]`, Anthropic `message_stop`) passes through and
/// everything after it is suppressed; a source that simply ends (Google)
/// gets `Done` appended. A sequence that yields an error terminates right
/// after it, without `Done`.
pub(crate) fn finalize_events<S>(inner: S) -> impl Stream<Item = Result<StreamEvent, LlmError>>
where
    S: Stream<Item = Result<StreamEvent, LlmError>>,
{
    #[derive(Default)]
    struct Tail {
        done: bool,
        failed: bool,
    }

    inner
        .map(Some)
        .chain(stream::once(async { None }))
        .scan(Tail::default(), |tail, item| {
            if tail.failed {
                return futures_util::future::ready(None);
            }

            let out: Vec<Result<StreamEvent, LlmError>> = match item {
                Some(Ok(StreamEvent::Done)) | None => {
                    if tail.done {
                        Vec::new()
                    } else {
                        tail.done = true;
                        vec![Ok(StreamEvent::Done)]
                    }
                }
                Some(Ok(event)) => {
                    if tail.done {
                        Vec::new()
                    } else {
                        vec![Ok(event)]
                    }
                }
                Some(Err(error)) => {
                    tail.failed = true;
                    vec![Err(error)]
                }
            };

            futures_util::future::ready(Some(out))
        })
        .flat_map(stream::iter)
}
