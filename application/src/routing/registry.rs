//! Process-wide route registry.
//!
//! Routes are registered once at startup; dispatch only reads. The
//! registry is shared behind an `Arc` and never mutated after the
//! interceptor is installed.

use super::handler::RouteHandler;
use hearth_domain::{ResolvedRoute, RouteInfo, RouteTable};
use std::sync::Arc;
use tracing::{debug, warn};

pub type SharedHandler = Arc<dyn RouteHandler>;

#[derive(Default)]
pub struct RouteRegistry {
    table: RouteTable<SharedHandler>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` (`*` for any) and a path. A path
    /// ending in `*` registers a prefix.
    pub fn register<H>(&mut self, method: &str, path: &str, handler: H) -> &mut Self
    where
        H: RouteHandler + 'static,
    {
        self.register_shared(method, path, Arc::new(handler))
    }

    pub fn register_shared(&mut self, method: &str, path: &str, handler: SharedHandler) -> &mut Self {
        if self.table.register(method, path, handler).is_some() {
            warn!("Route {} {} registered twice; keeping the newer handler", method, path);
        } else {
            debug!("Registered route {} {}", method, path);
        }
        self
    }

    pub fn can_handle(&self, method: &str, path: &str) -> bool {
        self.table.can_handle(method, path)
    }

    pub fn resolve(&self, method: &str, path: &str) -> Option<ResolvedRoute<'_, SharedHandler>> {
        self.table.resolve(method, path)
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.table.routes()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.table.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerResult;
    use crate::http::HandlerResponse;
    use crate::routing::handler::handler_fn;
    use serde_json::json;

    fn tagged(tag: &'static str) -> impl RouteHandler {
        handler_fn(move |_req| async move {
            HandlerResult::Ok(Some(HandlerResponse::ok_json(json!(tag))))
        })
    }

    #[test]
    fn exact_beats_prefix() {
        let mut registry = RouteRegistry::new();
        registry
            .register("GET", "/user/files/*", tagged("prefix"))
            .register("GET", "/user/files/a.png", tagged("exact"));

        let hit = registry.resolve("GET", "/user/files/a.png").unwrap();
        assert!(!hit.route.pattern.is_prefix());

        let hit = registry.resolve("get", "/user/files/b%20c.png").unwrap();
        assert_eq!(hit.wildcard_remainder, "b c.png");
        assert!(!registry.can_handle("POST", "/user/files/a.png"));
    }

    #[test]
    fn listing_is_stable() {
        let mut registry = RouteRegistry::new();
        registry
            .register("POST", "/api/chats/save", tagged("a"))
            .register("*", "/csrf-token", tagged("b"))
            .register("GET", "/user/files/*", tagged("c"));
        assert_eq!(registry.len(), 3);
        let routes = registry.routes();
        assert!(routes.last().unwrap().pattern.is_prefix());
    }
}
