//! Port for structured request transcripts.
//!
//! Separate from `tracing`: tracing carries human-readable diagnostics,
//! while this port records dispatched routes and stream lifecycles as
//! machine-readable records (JSONL).

use serde_json::Value;

/// One transcript record: a type tag and an event-specific payload.
pub struct TranscriptEvent {
    /// e.g. `"route_dispatched"`, `"stream_closed"`.
    pub event_type: &'static str,
    pub payload: Value,
}

impl TranscriptEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Synchronous and infallible; a failed write is dropped.
pub trait TranscriptLogger: Send + Sync {
    fn log(&self, event: TranscriptEvent);
}

/// No-op implementation for tests and when transcripts are disabled.
pub struct NoTranscriptLogger;

impl TranscriptLogger for NoTranscriptLogger {
    fn log(&self, _event: TranscriptEvent) {}
}
