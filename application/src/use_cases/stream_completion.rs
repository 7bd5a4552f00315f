//! Streaming chat completions over the native event bridge.
//!
//! The native side generates completions and publishes discrete events on
//! a per-stream channel. [`StreamingCompletionBridge`] turns them back into
//! a `text/event-stream` body:
//!
//! 1. subscribe to `chat-completion-stream:<id>`
//! 2. invoke `start_chat_completion_stream`
//! 3. feed events through a [`StreamSession`], writing its frames out,
//!    coalescing chunk frames for one flush interval
//! 4. on abort, or when the consumer drops the body, invoke
//!    `cancel_chat_completion_stream` once and close without a terminator
//!
//! Failures never surface as stream errors: they become provider-shaped
//! error frames followed by the terminator.

use crate::config::StreamingParams;
use crate::error::ApiError;
use crate::http::{ByteStream, HandlerResponse};
use crate::http::response::EVENT_STREAM;
use crate::ports::invoke_bridge::{EventSubscription, InvokeBridge, InvokeError};
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use bytes::Bytes;
use hearth_domain::completion::completion_error_body;
use hearth_domain::core::string::truncate;
use hearth_domain::{CompletionSource, FlushHint, NativeStreamEvent, SessionInput, StreamSession};
use http::StatusCode;
use http::header::{CACHE_CONTROL, HeaderValue};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const START_STREAM_COMMAND: &str = "start_chat_completion_stream";
pub const CANCEL_STREAM_COMMAND: &str = "cancel_chat_completion_stream";
pub const GENERATE_COMMAND: &str = "generate_chat_completion";

/// An open completion stream.
pub struct CompletionStream {
    pub id: String,
    pub body: ByteStream,
}

impl CompletionStream {
    pub fn into_response(self) -> HandlerResponse {
        HandlerResponse::stream(StatusCode::OK, EVENT_STREAM, self.body)
            .with_header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
    }
}

pub struct StreamingCompletionBridge {
    invoke: Arc<dyn InvokeBridge>,
    params: StreamingParams,
    transcript: Arc<dyn TranscriptLogger>,
    next_id: AtomicU64,
}

impl StreamingCompletionBridge {
    pub fn new(invoke: Arc<dyn InvokeBridge>, params: StreamingParams) -> Self {
        Self {
            invoke,
            params,
            transcript: Arc::new(NoTranscriptLogger),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptLogger>) -> Self {
        self.transcript = transcript;
        self
    }

    fn next_stream_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("{millis:x}-{n}")
    }

    /// Open a stream. The body is returned at once; subscribing and
    /// starting happen on a spawned task.
    pub fn open_stream(
        &self,
        source: CompletionSource,
        dto: Value,
        abort: CancellationToken,
    ) -> CompletionStream {
        let id = self.next_stream_id();
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        info!("Opening completion stream {} ({})", id, source);
        self.transcript.log(TranscriptEvent::new(
            "stream_opened",
            json!({ "stream_id": id, "source": source.as_str() }),
        ));

        let driver = SessionDriver {
            invoke: self.invoke.clone(),
            session: StreamSession::new(id.clone(), source),
            tx,
            flush_interval: self.params.flush_interval,
            transcript: self.transcript.clone(),
            start_sent: false,
        };
        tokio::spawn(driver.run(dto, abort));

        let body = futures::stream::poll_fn(move |cx| rx.poll_recv(cx).map(|frame| frame.map(Ok)));
        CompletionStream {
            id,
            body: Box::pin(body),
        }
    }

    /// Non-streaming generation. Native failures come back as a complete
    /// `chat.completion` whose message is the error text.
    pub async fn generate(&self, source: &CompletionSource, dto: Value) -> HandlerResponse {
        match self.invoke.invoke(GENERATE_COMMAND, json!({ "dto": dto })).await {
            Ok(completion) => HandlerResponse::ok_json(completion),
            Err(e @ InvokeError::Unavailable(_)) => ApiError::from(e).into_response(),
            Err(e) => {
                warn!("Chat completion for {} failed: {}", source, e);
                HandlerResponse::ok_json(completion_error_body(source, &e.message()))
            }
        }
    }
}

enum Step {
    Abort,
    ConsumerGone,
    Event(Option<Value>),
    Flush,
}

struct SessionDriver {
    invoke: Arc<dyn InvokeBridge>,
    session: StreamSession,
    tx: mpsc::UnboundedSender<Bytes>,
    flush_interval: Duration,
    transcript: Arc<dyn TranscriptLogger>,
    start_sent: bool,
}

impl SessionDriver {
    async fn run(mut self, dto: Value, abort: CancellationToken) {
        let subscription = match self.invoke.listen(self.session.event_name()).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!("Subscribing to {} failed: {}", self.session.event_name(), e);
                self.apply(SessionInput::StartFailed(e.message())).await;
                None
            }
        };

        if let Some(mut subscription) = subscription {
            self.start(dto, &abort).await;
            if !self.session.is_closed() {
                self.pump(&mut subscription, &abort).await;
            }
            subscription.unsubscribe();
        }

        self.transcript.log(TranscriptEvent::new(
            "stream_closed",
            json!({
                "stream_id": self.session.id(),
                "source": self.session.source().as_str(),
                "phase": self.session.phase().to_string(),
                "terminated": self.session.saw_terminator(),
            }),
        ));
        debug!("Completion stream {} closed ({})", self.session.id(), self.session.phase());
    }

    async fn start(&mut self, dto: Value, abort: &CancellationToken) {
        if abort.is_cancelled() {
            self.apply(SessionInput::Cancel).await;
            return;
        }
        let args = json!({ "streamId": self.session.id(), "dto": dto });
        self.start_sent = true;
        match self.invoke.invoke(START_STREAM_COMMAND, args).await {
            Ok(_) => {
                self.apply(SessionInput::Started).await;
            }
            Err(e) => {
                warn!("Starting completion stream {} failed: {}", self.session.id(), e);
                self.start_sent = false;
                self.apply(SessionInput::StartFailed(e.message())).await;
            }
        }
    }

    async fn pump(&mut self, subscription: &mut EventSubscription, abort: &CancellationToken) {
        let mut deadline: Option<Instant> = None;

        while !self.session.is_closed() {
            let step = tokio::select! {
                biased;
                _ = abort.cancelled() => Step::Abort,
                _ = self.tx.closed() => Step::ConsumerGone,
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => Step::Flush,
                event = subscription.recv() => Step::Event(event),
            };

            let hint = match step {
                Step::Abort | Step::ConsumerGone => {
                    self.apply(SessionInput::Cancel).await;
                    continue;
                }
                Step::Flush => {
                    deadline = None;
                    self.flush().await;
                    continue;
                }
                Step::Event(None) => {
                    let closed = NativeStreamEvent::Error("native event channel closed".to_string());
                    self.apply(SessionInput::Event(closed)).await
                }
                Step::Event(Some(raw)) => match NativeStreamEvent::from_json(&raw) {
                    Some(event) => self.apply(SessionInput::Event(event)).await,
                    None => {
                        warn!("Ignoring unrecognized stream event: {}", truncate(&raw.to_string(), 200));
                        FlushHint::Idle
                    }
                },
            };

            if hint == FlushHint::Deferred && deadline.is_none() {
                if self.flush_interval.is_zero() {
                    self.flush().await;
                } else {
                    deadline = Some(Instant::now() + self.flush_interval);
                }
            }
        }
    }

    /// Apply an input, performing immediate flushes and the native cancel
    /// its transition asks for.
    async fn apply(&mut self, input: SessionInput) -> FlushHint {
        let Some(transition) = self.session.apply(input) else {
            return FlushHint::Idle;
        };
        if transition.notify_native_cancel {
            self.notify_native_cancel().await;
        }
        if transition.flush == FlushHint::Immediate {
            self.flush().await;
        }
        transition.flush
    }

    /// Write out pending frames as one chunk of the body. A closed body
    /// counts as a cancel.
    async fn flush(&mut self) {
        let frames = self.session.take_frames();
        if frames.is_empty() {
            return;
        }
        if self.tx.send(Bytes::from(frames.concat())).is_err() {
            debug!("Consumer of stream {} went away", self.session.id());
            if let Some(transition) = self.session.apply(SessionInput::Cancel)
                && transition.notify_native_cancel
            {
                self.notify_native_cancel().await;
            }
        }
    }

    async fn notify_native_cancel(&mut self) {
        if !self.start_sent {
            return;
        }
        self.start_sent = false;
        let args = json!({ "streamId": self.session.id() });
        if let Err(e) = self.invoke.invoke(CANCEL_STREAM_COMMAND, args).await {
            warn!("Cancelling completion stream {} failed: {}", self.session.id(), e);
        }
    }
}
