//! `POST /api/backends/chat-completions/generate`

use crate::context::RouterContext;
use crate::error::{ApiError, HandlerResult};
use crate::routing::RouteRequest;
use hearth_domain::CompletionSource;
use serde_json::Value;
use std::sync::Arc;

/// Streams when the body asks for `stream: true`; otherwise answers with a
/// single `chat.completion`. The whole body is forwarded as the native dto.
pub async fn generate(ctx: Arc<RouterContext>, request: RouteRequest) -> HandlerResult {
    let Some(dto) = request.body.as_json().cloned() else {
        return Err(ApiError::BadRequest("expected a JSON body".to_string()));
    };
    let source = CompletionSource::new(
        dto.get("chat_completion_source")
            .and_then(Value::as_str)
            .unwrap_or("openai"),
    );

    if request.body.bool_field("stream") {
        let stream = ctx.completions.open_stream(source, dto, request.signal.clone());
        return Ok(Some(stream.into_response()));
    }
    Ok(Some(ctx.completions.generate(&source, dto).await))
}
