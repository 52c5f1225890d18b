//! Backend wire format types
//!
//! Explicit typed request/response schemas per backend, with a serde
//! boundary, so field-name drift between the three protocols is caught at
//! compile time instead of living in string-keyed lookups. Request shapes,
//! non-streaming response shapes, and streaming chunk shapes differ per
//! backend and are modeled separately.

pub mod anthropic;
pub mod google;
pub mod openai;
