//! Streaming completion session state machine.
//!
//! ```text
//! Starting ──started──▶ Streaming ──chunk([DONE]) / done──▶ Done
//!    │                     │  └──────error──────────────▶ Errored
//!    ├──start failed───────┼────────────────────────────▶ Errored
//!    └──cancel─────────────┴──cancel────────────────────▶ Cancelled
//! ```
//!
//! Terminal phases never transition again; inputs arriving after the
//! session closed are ignored. Frames are queued in arrival order and the
//! terminator is always the last frame queued.

use super::frame::{is_terminator, sse_frame, stream_error_frame, terminator_frame};
use super::source::CompletionSource;
use serde_json::Value;
use std::fmt;

/// Prefix of the per-session native event name.
pub const STREAM_EVENT_PREFIX: &str = "chat-completion-stream:";

/// Lifecycle phase of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Starting,
    Streaming,
    Done,
    Errored,
    Cancelled,
}

impl StreamPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamPhase::Done | StreamPhase::Errored | StreamPhase::Cancelled
        )
    }
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamPhase::Starting => "starting",
            StreamPhase::Streaming => "streaming",
            StreamPhase::Done => "done",
            StreamPhase::Errored => "errored",
            StreamPhase::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A native event delivered on the session's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeStreamEvent {
    Chunk(String),
    Error(String),
    Done,
}

impl NativeStreamEvent {
    /// Parse `{type: "chunk" | "error" | "done", data?, message?}`.
    ///
    /// A chunk's `data` is usually the provider's JSON text; an object is
    /// re-serialized so it can be framed verbatim.
    pub fn from_json(event: &Value) -> Option<Self> {
        match event.get("type").and_then(Value::as_str)? {
            "chunk" => {
                let data = match event.get("data") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                Some(NativeStreamEvent::Chunk(data))
            }
            "error" => {
                let message = event
                    .get("message")
                    .or_else(|| event.get("data"))
                    .map(crate::core::error_value::normalize_error_message)
                    .unwrap_or_else(|| "Unknown stream error".to_string());
                Some(NativeStreamEvent::Error(message))
            }
            "done" => Some(NativeStreamEvent::Done),
            _ => None,
        }
    }
}

/// Inputs driving a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    /// The native start command succeeded.
    Started,
    /// Subscribing or the native start command failed.
    StartFailed(String),
    Event(NativeStreamEvent),
    /// The consumer aborted.
    Cancel,
}

/// How soon pending frames should be written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushHint {
    /// Nothing new to write.
    Idle,
    /// Coalesce with frames arriving shortly after.
    Deferred,
    /// Write now; the session has closed or is about to.
    Immediate,
}

/// Effect of applying one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StreamPhase,
    pub to: StreamPhase,
    pub flush: FlushHint,
    /// The native side must be told to stop generating.
    pub notify_native_cancel: bool,
}

impl Transition {
    pub fn closed_session(&self) -> bool {
        !self.from.is_terminal() && self.to.is_terminal()
    }
}

/// Phase reached from `phase` on `input`, or `None` when the input is
/// ignored.
pub fn next_phase(phase: StreamPhase, input: &SessionInput) -> Option<StreamPhase> {
    use NativeStreamEvent as E;
    use SessionInput as I;
    use StreamPhase as P;

    match (phase, input) {
        (P::Done | P::Errored | P::Cancelled, _) => None,

        (P::Starting, I::Started) => Some(P::Streaming),
        (P::Starting, I::StartFailed(_)) => Some(P::Errored),
        (P::Streaming, I::Started | I::StartFailed(_)) => None,

        (P::Starting | P::Streaming, I::Event(E::Chunk(data))) if is_terminator(data) => Some(P::Done),
        // Native events may race ahead of the start acknowledgement.
        (P::Starting | P::Streaming, I::Event(E::Chunk(_))) => Some(P::Streaming),
        (P::Starting | P::Streaming, I::Event(E::Error(_))) => Some(P::Errored),
        (P::Starting | P::Streaming, I::Event(E::Done)) => Some(P::Done),
        (P::Starting | P::Streaming, I::Cancel) => Some(P::Cancelled),
    }
}

/// One outstanding completion stream.
#[derive(Debug)]
pub struct StreamSession {
    id: String,
    event_name: String,
    source: CompletionSource,
    pending_frames: Vec<String>,
    phase: StreamPhase,
    saw_terminator: bool,
}

impl StreamSession {
    pub fn new(id: impl Into<String>, source: CompletionSource) -> Self {
        let id = id.into();
        Self {
            event_name: format!("{STREAM_EVENT_PREFIX}{id}"),
            id,
            source,
            pending_frames: Vec::new(),
            phase: StreamPhase::Starting,
            saw_terminator: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn source(&self) -> &CompletionSource {
        &self.source
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn saw_terminator(&self) -> bool {
        self.saw_terminator
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_frames.is_empty()
    }

    /// Apply an input. Returns `None` if it was ignored (late events after
    /// close, duplicate acknowledgements).
    pub fn apply(&mut self, input: SessionInput) -> Option<Transition> {
        let from = self.phase;
        let to = next_phase(from, &input)?;

        let flush = match input {
            SessionInput::Started => FlushHint::Idle,
            SessionInput::StartFailed(message)
            | SessionInput::Event(NativeStreamEvent::Error(message)) => {
                self.pending_frames
                    .push(stream_error_frame(&self.source, &message));
                self.push_terminator();
                FlushHint::Immediate
            }
            SessionInput::Event(NativeStreamEvent::Chunk(data)) => {
                if to == StreamPhase::Done {
                    self.push_terminator();
                    FlushHint::Immediate
                } else {
                    self.pending_frames.push(sse_frame(&data));
                    FlushHint::Deferred
                }
            }
            SessionInput::Event(NativeStreamEvent::Done) => {
                self.push_terminator();
                FlushHint::Immediate
            }
            SessionInput::Cancel => {
                // The consumer is discarding the body; nothing more is written.
                self.pending_frames.clear();
                FlushHint::Idle
            }
        };

        self.phase = to;
        Some(Transition {
            from,
            to,
            flush,
            notify_native_cancel: to == StreamPhase::Cancelled,
        })
    }

    /// Drain queued frames in arrival order.
    pub fn take_frames(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_frames)
    }

    fn push_terminator(&mut self) {
        if !self.saw_terminator {
            self.saw_terminator = true;
            self.pending_frames.push(terminator_frame());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(data: &str) -> SessionInput {
        SessionInput::Event(NativeStreamEvent::Chunk(data.to_string()))
    }

    #[test]
    fn event_name_embeds_id() {
        let session = StreamSession::new("abc", CompletionSource::default());
        assert_eq!(session.event_name(), "chat-completion-stream:abc");
        assert_eq!(session.phase(), StreamPhase::Starting);
    }

    #[test]
    fn chunk_then_terminator_chunk() {
        let mut session = StreamSession::new("s1", "openai".into());
        session.apply(SessionInput::Started).unwrap();

        let t = session.apply(chunk("data1")).unwrap();
        assert_eq!(t.flush, FlushHint::Deferred);

        let t = session.apply(chunk("[DONE]")).unwrap();
        assert_eq!(t.to, StreamPhase::Done);
        assert_eq!(t.flush, FlushHint::Immediate);
        assert!(!t.notify_native_cancel);
        assert!(t.closed_session());

        assert_eq!(
            session.take_frames(),
            vec!["data: data1\n\n".to_string(), "data: [DONE]\n\n".to_string()]
        );
    }

    #[test]
    fn done_event_appends_terminator_once() {
        let mut session = StreamSession::new("s2", "openai".into());
        session.apply(SessionInput::Started);
        session.apply(chunk("[DONE]"));
        assert!(session.apply(SessionInput::Event(NativeStreamEvent::Done)).is_none());
        let frames = session.take_frames();
        assert_eq!(frames, vec!["data: [DONE]\n\n".to_string()]);
    }

    #[test]
    fn error_event_emits_error_frame_then_terminator() {
        let mut session = StreamSession::new("s3", "claude".into());
        session.apply(SessionInput::Started);
        let t = session
            .apply(SessionInput::Event(NativeStreamEvent::Error("overloaded".into())))
            .unwrap();
        assert_eq!(t.to, StreamPhase::Errored);

        let frames = session.take_frames();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("content_block_delta"));
        assert_eq!(frames[1], "data: [DONE]\n\n");
    }

    #[test]
    fn start_failure_goes_straight_to_errored() {
        let mut session = StreamSession::new("s4", "openai".into());
        let t = session
            .apply(SessionInput::StartFailed("no bridge".into()))
            .unwrap();
        assert_eq!((t.from, t.to), (StreamPhase::Starting, StreamPhase::Errored));
        assert!(session.saw_terminator());
    }

    #[test]
    fn cancel_drops_pending_frames_and_requests_native_cancel() {
        let mut session = StreamSession::new("s5", "openai".into());
        session.apply(SessionInput::Started);
        session.apply(chunk("partial"));
        let t = session.apply(SessionInput::Cancel).unwrap();
        assert!(t.notify_native_cancel);
        assert!(session.take_frames().is_empty());
        assert!(!session.saw_terminator());
    }

    #[test]
    fn terminal_phases_ignore_everything() {
        let mut session = StreamSession::new("s6", "openai".into());
        session.apply(SessionInput::Cancel);
        for input in [
            SessionInput::Started,
            chunk("late"),
            SessionInput::Event(NativeStreamEvent::Done),
            SessionInput::Cancel,
        ] {
            assert!(session.apply(input).is_none());
        }
        assert_eq!(session.phase(), StreamPhase::Cancelled);
    }

    #[test]
    fn chunk_before_start_ack_is_accepted() {
        let mut session = StreamSession::new("s7", "openai".into());
        let t = session.apply(chunk("early")).unwrap();
        assert_eq!(t.to, StreamPhase::Streaming);
        assert!(session.apply(SessionInput::Started).is_none());
    }

    #[test]
    fn parses_native_events() {
        assert_eq!(
            NativeStreamEvent::from_json(&json!({"type": "chunk", "data": "{\"x\":1}"})),
            Some(NativeStreamEvent::Chunk("{\"x\":1}".into()))
        );
        assert_eq!(
            NativeStreamEvent::from_json(&json!({"type": "chunk", "data": {"x": 1}})),
            Some(NativeStreamEvent::Chunk("{\"x\":1}".into()))
        );
        assert_eq!(
            NativeStreamEvent::from_json(&json!({"type": "error", "message": {"error": "boom"}})),
            Some(NativeStreamEvent::Error("boom".into()))
        );
        assert_eq!(
            NativeStreamEvent::from_json(&json!({"type": "done"})),
            Some(NativeStreamEvent::Done)
        );
        assert_eq!(NativeStreamEvent::from_json(&json!({"type": "ping"})), None);
    }
}
