//! Infrastructure endpoints the client polls at startup.

use crate::context::RouterContext;
use crate::error::HandlerResult;
use crate::http::HandlerResponse;
use crate::routing::RouteRequest;
use serde_json::json;
use std::sync::Arc;

/// There is no server session to protect, so the token is a fixed marker.
pub async fn csrf_token(_ctx: Arc<RouterContext>, _request: RouteRequest) -> HandlerResult {
    Ok(Some(HandlerResponse::ok_json(json!({ "token": "disabled" }))))
}

pub async fn version(ctx: Arc<RouterContext>, _request: RouteRequest) -> HandlerResult {
    let config = &ctx.config;
    Ok(Some(HandlerResponse::ok_json(json!({
        "agent": config.user_agent(),
        "pkgVersion": config.version,
        "gitRevision": null,
        "gitBranch": null,
    }))))
}
