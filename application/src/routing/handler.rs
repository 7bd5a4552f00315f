//! The route handler seam.

use crate::error::HandlerResult;
use crate::http::{RawBody, RequestBody};
use async_trait::async_trait;
use hearth_domain::RouteInfo;
use http::{HeaderMap, Method};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A matched request as a handler sees it.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    /// Fully resolved request URL.
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// The body exactly as the caller supplied it, before normalization.
    pub raw: RawBody,
    /// The route that matched.
    pub route: RouteInfo,
    /// Decoded path tail beyond a matched prefix; empty for exact routes.
    pub wildcard: String,
    /// Cancelled when the caller aborts the request.
    pub signal: CancellationToken,
}

impl RouteRequest {
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// Handles requests for one registered route.
///
/// `Ok(None)` means the handler had nothing to say; the caller then gets a
/// 404 naming the path.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: RouteRequest) -> HandlerResult;
}

/// Adapter turning an async closure into a [`RouteHandler`].
pub struct FnHandler<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(RouteRequest) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(RouteRequest) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, request: RouteRequest) -> HandlerResult {
        (self.0)(request).await
    }
}
