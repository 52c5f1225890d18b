//! Token-usage tracking shared across completions
//!
//! The recorder is the only cross-request shared state in this crate. It is
//! injected into the client at construction (never a global) and must accept
//! concurrent, order-insensitive appends from many simultaneous completions.

use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Which client operation produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Buffered one-shot completion
    OneShot,
    /// Streaming completion
    Streaming,
}

/// One usage observation
#[derive(Debug, Clone)]
pub struct UsageRecord {
    /// Id of the completion this record belongs to; streaming responses may
    /// produce several records under one id
    pub request_id: Uuid,
    /// Provider that served the request
    pub provider: &'static str,
    /// Model used
    pub model: String,
    /// Prompt tokens observed
    pub prompt_tokens: u32,
    /// Completion tokens observed
    pub completion_tokens: u32,
    /// Whether the counts came from the estimator instead of the backend
    pub estimated: bool,
    /// Operation that produced the record
    pub kind: RequestKind,
}

/// Sink for usage records
///
/// `record` must be non-blocking; implementations synchronize internally.
pub trait UsageRecorder: Send + Sync {
    /// Append one observation
    fn record(&self, record: UsageRecord);
}

/// Recorder that keeps everything in memory
///
/// Mutex-guarded append-only vec; suitable for tests and for surfacing
/// session totals in the UI.
#[derive(Debug, Default)]
pub struct MemoryUsageRecorder {
    records: Mutex<Vec<UsageRecord>>,
}

impl MemoryUsageRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record so far
    pub fn snapshot(&self) -> Vec<UsageRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }

    /// Summed `(prompt, completion)` tokens across all records
    pub fn totals(&self) -> (u64, u64) {
        self.snapshot().iter().fold((0, 0), |(prompt, completion), record| {
            (
                prompt + u64::from(record.prompt_tokens),
                completion + u64::from(record.completion_tokens),
            )
        })
    }
}

impl UsageRecorder for MemoryUsageRecorder {
    fn record(&self, record: UsageRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

/// Recorder that hands records to an application-owned channel
///
/// Fire-and-forget; if the receiver is gone the record is dropped with a
/// warning rather than blocking a completion.
pub struct ChannelUsageRecorder {
    tx: mpsc::UnboundedSender<UsageRecord>,
}

impl ChannelUsageRecorder {
    /// Create a recorder and the receiver the application drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UsageRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UsageRecorder for ChannelUsageRecorder {
    fn record(&self, record: UsageRecord) {
        if let Err(e) = self.tx.send(record) {
            tracing::warn!(error = %e, "failed to enqueue usage record, channel closed");
        }
    }
}

impl std::fmt::Debug for ChannelUsageRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelUsageRecorder").finish_non_exhaustive()
    }
}

/// Recorder that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsageRecorder;

impl UsageRecorder for NoopUsageRecorder {
    fn record(&self, _record: UsageRecord) {}
}
