//! Shared test harness

// Shared across test binaries; not every binary uses every helper
#![allow(dead_code)]

pub mod mock_backend;

pub use mock_backend::{MockBackend, MockResponse};

/// Frame JSON lines as an SSE body
pub fn sse_body(lines: &[&str]) -> String {
    let mut body = String::new();
    for line in lines {
        body.push_str("data: ");
        body.push_str(line);
        body.push_str("\n\n");
    }
    body
}
