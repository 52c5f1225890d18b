use thiserror::Error;

/// Errors surfaced by the LLM client
///
/// Per-line SSE parse failures and tool calls that never receive a closing
/// event are recovered locally and never reach this enum; everything else
/// aborts the request.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Cloud target configured without an API key; raised before any
    /// network call
    #[error("missing API key for provider: {provider}")]
    MissingApiKey {
        /// Provider that lacked credentials
        provider: &'static str,
    },

    /// Response envelope could not be parsed as the backend's shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Successful HTTP response carried no usable text content
    #[error("empty response from model")]
    EmptyResponse,

    /// Backend returned a non-2xx status
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Diagnostic text extracted from the provider's error body
        message: String,
    },

    /// Reserved for a future capability check; capability probing is
    /// currently disabled by design, so this is never raised
    #[error("model does not support tool calls: {model}")]
    ToolsNotSupported {
        /// Model that rejected tool use
        model: String,
    },

    /// Connect or send failure before a response envelope arrived
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body stream failed mid-flight; the event sequence ends
    /// with this error and no `Done`
    #[error("stream interrupted: {0}")]
    Stream(String),

    /// The caller's cancellation token fired before the network call
    #[error("request cancelled")]
    Cancelled,
}
