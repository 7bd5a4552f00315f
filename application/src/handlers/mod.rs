//! Built-in route handlers.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /csrf-token` | [`system::csrf_token`] |
//! | `GET /version` | [`system::version`] |
//! | `POST /api/chats/save` | [`chats::save_chat`] |
//! | `POST /api/chats/get` | [`chats::get_chat`] |
//! | `POST /api/chats/group/save` | [`chats::save_group_chat`] |
//! | `POST /api/chats/group/get` | [`chats::get_group_chat`] |
//! | `POST /api/backends/chat-completions/generate` | [`completions::generate`] |
//! | `GET /user/files/*` | [`user_files::serve`] |

pub mod chats;
pub mod completions;
pub mod system;
pub mod user_files;

use crate::context::RouterContext;
use crate::error::HandlerResult;
use crate::routing::{RouteHandler, RouteRegistry, RouteRequest, handler_fn};
use std::future::Future;
use std::sync::Arc;

/// Adapt `f(ctx, request)` into a handler holding its own context.
fn bind<F, Fut>(ctx: &Arc<RouterContext>, f: F) -> impl RouteHandler + 'static
where
    F: Fn(Arc<RouterContext>, RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let ctx = ctx.clone();
    handler_fn(move |request| f(ctx.clone(), request))
}

pub fn register_builtin_routes(registry: &mut RouteRegistry, ctx: &Arc<RouterContext>) {
    registry
        .register("GET", "/csrf-token", bind(ctx, system::csrf_token))
        .register("GET", "/version", bind(ctx, system::version))
        .register("POST", "/api/chats/save", bind(ctx, chats::save_chat))
        .register("POST", "/api/chats/get", bind(ctx, chats::get_chat))
        .register("POST", "/api/chats/group/save", bind(ctx, chats::save_group_chat))
        .register("POST", "/api/chats/group/get", bind(ctx, chats::get_group_chat))
        .register(
            "POST",
            "/api/backends/chat-completions/generate",
            bind(ctx, completions::generate),
        )
        .register("GET", "/user/files/*", bind(ctx, user_files::serve));
}
