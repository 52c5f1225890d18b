//! Mock LLM backend server for integration tests
//!
//! Serves one configured response for any POST and captures every request
//! (path, headers, body) for assertions. The canned body carries whichever
//! backend's wire format a test needs, so one server stands in for all
//! three protocols.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::sync::CancellationToken;

/// Canned response the mock returns for every request
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Response body
    pub body: String,
}

impl MockResponse {
    /// A 200 SSE response
    pub fn sse(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/event-stream",
            body,
        }
    }

    /// A 200 JSON response
    pub fn json(body: &serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    /// An error response with a JSON body
    pub fn error(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    /// A raw response with an arbitrary body
    pub fn raw(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            content_type,
            body,
        }
    }
}

/// One captured request
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request path including the query string
    pub path: String,
    /// Headers with lowercase names
    pub headers: HashMap<String, String>,
    /// Parsed JSON body (`null` when the body was not JSON)
    pub body: serde_json::Value,
}

struct MockState {
    response: MockResponse,
    requests: Mutex<Vec<CapturedRequest>>,
}

/// Mock backend returning one configured response
pub struct MockBackend {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Start the mock server, returning immediately
    pub async fn start(response: MockResponse) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            response,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    ///
    /// Includes `/v1` since the OpenAI-style providers append paths like
    /// `/chat/completions`.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Base URL without a version prefix, for the Google provider
    pub fn root_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The single request a one-request test expects
    ///
    /// # Panics
    ///
    /// Panics when the mock saw zero or multiple requests.
    pub fn single_request(&self) -> CapturedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.into_iter().next().unwrap()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle(State(state): State<Arc<MockState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let path = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string);

    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                value.to_str().unwrap_or_default().to_owned(),
            )
        })
        .collect();

    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    if let Ok(mut requests) = state.requests.lock() {
        requests.push(CapturedRequest { path, headers, body });
    }

    Response::builder()
        .status(state.response.status)
        .header(header::CONTENT_TYPE, state.response.content_type)
        .body(Body::from(state.response.body.clone()))
        .expect("valid response")
}
