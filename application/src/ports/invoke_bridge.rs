//! Port for the native command bridge.
//!
//! The host process exposes named commands (`save_chat_from_file`,
//! `start_chat_completion_stream`, ...) and named event channels. Route
//! handlers and the streaming bridge reach the native side only through
//! [`InvokeBridge`].

use async_trait::async_trait;
use hearth_domain::{ErrorKind, ErrorValue};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failure of a native call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvokeError {
    /// No bridge is attached to this process.
    #[error("native invoke bridge is unavailable: {0}")]
    Unavailable(String),

    /// The bridge has no command under this name.
    #[error("native command not found: {0}")]
    CommandNotFound(String),

    /// The command ran and rejected the call.
    #[error("{message}")]
    Rejected { message: String },
}

impl InvokeError {
    /// Build a rejection from whatever shape the native side failed with.
    pub fn rejected(raw: impl Into<ErrorValue>) -> Self {
        InvokeError::Rejected {
            message: raw.into().message(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            InvokeError::Unavailable(_) => ErrorKind::TransportUnavailable,
            InvokeError::CommandNotFound(_) => ErrorKind::Internal,
            InvokeError::Rejected { message } => ErrorKind::classify(message),
        }
    }

    pub fn message(&self) -> String {
        match self {
            InvokeError::Rejected { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type InvokeResult<T> = std::result::Result<T, InvokeError>;

/// Native command and event bridge.
#[async_trait]
pub trait InvokeBridge: Send + Sync {
    /// Run a named native command with JSON arguments.
    async fn invoke(&self, command: &str, args: Value) -> InvokeResult<Value>;

    /// Subscribe to a named native event channel.
    ///
    /// Events published before the subscription exists are not replayed.
    async fn listen(&self, event: &str) -> InvokeResult<EventSubscription>;
}

/// A live subscription to one native event channel.
///
/// Unsubscribes exactly once: on [`unsubscribe`](Self::unsubscribe) or on
/// drop, whichever comes first.
pub struct EventSubscription {
    event: String,
    rx: mpsc::UnboundedReceiver<Value>,
    unlisten: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl EventSubscription {
    pub fn new(
        event: impl Into<String>,
        rx: mpsc::UnboundedReceiver<Value>,
        unlisten: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            event: event.into(),
            rx,
            unlisten: Some(Box::new(unlisten)),
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Next event payload, or `None` once the native side closed the channel.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    pub fn is_active(&self) -> bool {
        self.unlisten.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(unlisten) = self.unlisten.take() {
            self.rx.close();
            unlisten();
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("event", &self.event)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn rejection_message_is_normalized() {
        let err = InvokeError::rejected(json!({"error": {"message": "Chat not found"}}));
        assert_eq!(err.message(), "Chat not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn unavailable_is_not_classified_by_text() {
        let err = InvokeError::Unavailable("not found in window".into());
        assert_eq!(err.kind(), ErrorKind::TransportUnavailable);
        assert_eq!(
            InvokeError::CommandNotFound("x".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[tokio::test]
    async fn unsubscribes_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let counter = calls.clone();
        let mut sub = EventSubscription::new("ev", rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tx.send(json!(1)).unwrap();
        assert_eq!(sub.recv().await, Some(json!(1)));

        sub.unsubscribe();
        sub.unsubscribe();
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drop_unsubscribes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = mpsc::unbounded_channel();
        let counter = calls.clone();
        let sub = EventSubscription::new("ev", rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(sub.is_active());
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
