//! In-process native command bridge.
//!
//! [`LocalInvokeBridge`] stands in for a native host: commands are async
//! closures registered by name, events flow through an [`EventHub`]. The
//! CLI uses it to replay recorded sessions, and the integration tests use
//! it to run the whole stack without a host process.

use super::event_hub::{EventEmitter, EventHub};
use async_trait::async_trait;
use futures::future::BoxFuture;
use hearth_application::ports::invoke_bridge::{
    EventSubscription, InvokeBridge, InvokeError, InvokeResult,
};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

type CommandFn = Arc<dyn Fn(Value) -> BoxFuture<'static, InvokeResult<Value>> + Send + Sync>;

pub struct LocalInvokeBridge {
    commands: RwLock<HashMap<String, CommandFn>>,
    hub: Arc<EventHub>,
}

impl Default for LocalInvokeBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalInvokeBridge {
    pub fn new() -> Self {
        Self {
            commands: RwLock::new(HashMap::new()),
            hub: EventHub::new(),
        }
    }

    /// Register `command`, replacing any previous handler of that name.
    pub fn register_command<F, Fut>(&self, command: &str, handler: F) -> &Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = InvokeResult<Value>> + Send + 'static,
    {
        let handler: CommandFn = Arc::new(move |args| Box::pin(handler(args)));
        let previous = self
            .commands
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(command.to_string(), handler);
        if previous.is_some() {
            warn!("Native command {} registered twice; keeping the newer handler", command);
        }
        self
    }

    pub fn has_command(&self, command: &str) -> bool {
        self.commands
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(command)
    }

    /// Publish on a named event channel.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        self.hub.emit(event, payload)
    }

    /// A handle for command handlers that publish events.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter::new(self.hub.clone())
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.hub.subscriber_count(event)
    }
}

#[async_trait]
impl InvokeBridge for LocalInvokeBridge {
    async fn invoke(&self, command: &str, args: Value) -> InvokeResult<Value> {
        let handler = self
            .commands
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(command)
            .cloned();
        let Some(handler) = handler else {
            return Err(InvokeError::CommandNotFound(command.to_string()));
        };
        debug!("Invoking native command {}", command);
        handler(args).await
    }

    async fn listen(&self, event: &str) -> InvokeResult<EventSubscription> {
        Ok(self.hub.subscribe(event))
    }
}
