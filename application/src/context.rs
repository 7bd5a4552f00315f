//! Everything the built-in routes share.
//!
//! A [`RouterContext`] is assembled once at startup from the adapters the
//! host provides. It owns the streaming completion bridge and builds the
//! route registry and the interceptor on top of itself.

use crate::config::BridgeConfig;
use crate::handlers;
use crate::interceptor::{Interceptor, RequestDispatcher};
use crate::ports::invoke_bridge::InvokeBridge;
use crate::ports::scratch_storage::ScratchStorage;
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptLogger};
use crate::routing::RouteRegistry;
use crate::use_cases::stream_completion::StreamingCompletionBridge;
use std::sync::Arc;
use tracing::info;

pub struct RouterContext {
    pub invoke: Arc<dyn InvokeBridge>,
    pub storage: Arc<dyn ScratchStorage>,
    pub completions: Arc<StreamingCompletionBridge>,
    pub config: BridgeConfig,
    pub transcript: Arc<dyn TranscriptLogger>,
}

impl RouterContext {
    pub fn new(
        invoke: Arc<dyn InvokeBridge>,
        storage: Arc<dyn ScratchStorage>,
        config: BridgeConfig,
    ) -> Self {
        Self::with_transcript(invoke, storage, config, Arc::new(NoTranscriptLogger))
    }

    pub fn with_transcript(
        invoke: Arc<dyn InvokeBridge>,
        storage: Arc<dyn ScratchStorage>,
        config: BridgeConfig,
        transcript: Arc<dyn TranscriptLogger>,
    ) -> Self {
        let completions = StreamingCompletionBridge::new(invoke.clone(), config.streaming.clone())
            .with_transcript(transcript.clone());
        Self {
            invoke,
            storage,
            completions: Arc::new(completions),
            config,
            transcript,
        }
    }

    /// A registry holding every built-in route.
    pub fn build_registry(self: &Arc<Self>) -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        handlers::register_builtin_routes(&mut registry, self);
        info!("Registered {} built-in routes", registry.len());
        registry
    }

    /// An interceptor dispatching to `registry`.
    pub fn build_interceptor(&self, registry: RouteRegistry) -> Interceptor {
        let dispatcher =
            RequestDispatcher::new(Arc::new(registry)).with_transcript(self.transcript.clone());
        Interceptor::new(Arc::new(dispatcher), self.config.interceptor.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::temp_file::tests::MemoryStorage;
    use crate::use_cases::stream_completion::tests::ScriptedBridge;

    #[test]
    fn registry_holds_every_builtin_route() {
        let ctx = Arc::new(RouterContext::new(
            Arc::new(ScriptedBridge::default()),
            Arc::new(MemoryStorage::default()),
            BridgeConfig::default(),
        ));
        let registry = ctx.build_registry();
        assert_eq!(registry.len(), 8);
        assert!(registry.can_handle("GET", "/csrf-token"));
        assert!(registry.can_handle("POST", "/api/chats/group/get"));
        assert!(registry.can_handle("GET", "/user/files/images/a.png"));
        assert!(!registry.can_handle("POST", "/csrf-token"));

        let interceptor = ctx.build_interceptor(registry);
        assert_eq!(interceptor.dispatcher().registry().len(), 8);
    }
}
