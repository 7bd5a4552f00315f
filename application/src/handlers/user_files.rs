//! `GET /user/files/*`: files from the user data directory.

use crate::context::RouterContext;
use crate::error::{ApiError, HandlerResult};
use crate::http::HandlerResponse;
use crate::routing::RouteRequest;
use http::StatusCode;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const RESOLVE_USER_FILE_COMMAND: &str = "resolve_user_file_path";

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        "jsonl" => "application/jsonl",
        "txt" | "md" => "text/plain; charset=utf-8",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "html" => "text/html; charset=utf-8",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// The path a client may name: relative, without parent traversal.
fn checked_relative_path(wildcard: &str) -> Result<&str, ApiError> {
    let relative = wildcard.trim_start_matches('/');
    if relative.is_empty() {
        return Err(ApiError::BadRequest("missing file path".to_string()));
    }
    if relative.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(ApiError::Forbidden(format!("path escapes user files: {relative}")));
    }
    Ok(relative)
}

pub async fn serve(ctx: Arc<RouterContext>, request: RouteRequest) -> HandlerResult {
    let relative = checked_relative_path(&request.wildcard)?;
    let resolved = ctx
        .invoke
        .invoke(RESOLVE_USER_FILE_COMMAND, json!({ "relativePath": relative }))
        .await?;
    let Some(path) = resolved.as_str().map(PathBuf::from) else {
        debug!("No native path for user file {}", relative);
        return Ok(None);
    };

    let stream = ctx.storage.open_asset_stream(&path).await?;
    Ok(Some(HandlerResponse::stream(
        StatusCode::OK,
        content_type_for(&path),
        stream,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::system::tests::{context, json_of, request};
    use crate::http::{FetchResponse, RequestBody};
    use crate::transport::temp_file::tests::MemoryStorage;
    use crate::use_cases::stream_completion::tests::ScriptedBridge;
    use http::Method;

    fn file_request(tail: &str) -> RouteRequest {
        let mut req = request(Method::GET, &format!("/user/files/{tail}"), RequestBody::Empty);
        req.wildcard = tail.to_string();
        req
    }

    #[tokio::test]
    async fn streams_resolved_file_with_its_type() {
        let bridge = Arc::new(ScriptedBridge::default());
        bridge.respond(RESOLVE_USER_FILE_COMMAND, Ok(json!("/data/user/files/notes/a.txt")));
        let storage = Arc::new(MemoryStorage::default());
        storage.insert("/data/user/files/notes/a.txt", b"hello from the user dir");
        let ctx = context(bridge.clone(), storage);

        let response = serve(ctx, file_request("notes/a.txt")).await.unwrap().unwrap();
        assert_eq!(response.content_type(), Some("text/plain; charset=utf-8"));
        let response: FetchResponse = response.into();
        assert_eq!(response.text().await.unwrap(), "hello from the user dir");
        assert_eq!(
            bridge.calls_to(RESOLVE_USER_FILE_COMMAND)[0]["relativePath"],
            "notes/a.txt"
        );
    }

    #[tokio::test]
    async fn traversal_is_forbidden() {
        let bridge = Arc::new(ScriptedBridge::default());
        let ctx = context(bridge.clone(), Default::default());
        let err = serve(ctx, file_request("../secrets.json")).await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert!(json_of(response)["error"].as_str().unwrap().contains("secrets"));
        assert!(bridge.calls_to(RESOLVE_USER_FILE_COMMAND).is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let bridge = Arc::new(ScriptedBridge::default());
        bridge.respond(RESOLVE_USER_FILE_COMMAND, Ok(json!("/data/none.png")));
        let ctx = context(bridge, Default::default());
        let err = serve(ctx, file_request("none.png")).await.unwrap_err();
        assert_eq!(err.into_response().status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("a")), "application/octet-stream");
    }
}
