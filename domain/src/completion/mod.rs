//! Chat-completion streaming model.
//!
//! - [`source::CompletionSource`]: declared provider and its wire format
//! - [`frame`]: SSE framing and provider-shaped error frames
//! - [`session::StreamSession`]: per-stream state machine

pub mod frame;
pub mod session;
pub mod source;

pub use frame::{
    ERROR_LABEL, STREAM_TERMINATOR, completion_error_body, format_error_text, sse_frame,
    stream_error_frame, stream_error_payload, terminator_frame,
};
pub use session::{
    FlushHint, NativeStreamEvent, STREAM_EVENT_PREFIX, SessionInput, StreamPhase, StreamSession,
    Transition, next_phase,
};
pub use source::{CompletionSource, WireFormat};
