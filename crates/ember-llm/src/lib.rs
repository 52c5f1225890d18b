//! Unified LLM client for Ember
//!
//! Ember's agent loop, research loop, terminal-suggestion pipeline, and
//! test-runner analyzer all talk to model backends through this crate. It
//! reconciles three structurally different wire protocols (OpenAI-compatible
//! chat, Anthropic Messages, Google Gemini) plus local OpenAI-compatible
//! servers behind one provider-agnostic request shape and one canonical
//! stream event sequence, reassembling tool-call arguments that arrive
//! fragmented across stream chunks.
//!
//! This crate builds requests, decodes streams, and normalizes events; it
//! does not pick tools, execute them, retry failures, or cache responses —
//! those are consumer responsibilities.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod accumulator;
pub mod client;
pub mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod types;
pub mod usage;

pub use client::LlmClient;
pub use error::LlmError;
pub use provider::{EventStream, Provider};
pub use types::{
    ChatMessage, ChatRequest, CompletionOutcome, ParsedToolCall, ProviderTarget, ReasoningEffort, ReasoningOptions,
    Role, StopReason, StreamEvent, TokenUsage, ToolSchema, ToolSupport,
};
pub use usage::{ChannelUsageRecorder, MemoryUsageRecorder, NoopUsageRecorder, RequestKind, UsageRecord, UsageRecorder};
