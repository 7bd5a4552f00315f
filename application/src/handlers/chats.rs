//! Chat file routes.
//!
//! Transcripts never cross the native bridge as one JSON argument. Saves
//! are written to a scratch JSONL file whose path is handed to the native
//! command; reads ask the native side for the file path and stream the
//! file back.

use crate::context::RouterContext;
use crate::error::{ApiError, HandlerResult};
use crate::http::{HandlerResponse, RequestBody};
use crate::routing::RouteRequest;
use crate::transport::{decode_stream, with_temp_file};
use bytes::Bytes;
use hearth_domain::jsonl::{self, JsonObject};
use hearth_domain::ChatPayload;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub const SAVE_CHAT_COMMAND: &str = "save_chat_from_file";
pub const SAVE_GROUP_CHAT_COMMAND: &str = "save_group_chat_from_file";
pub const CHAT_PATH_COMMAND: &str = "get_chat_file_path";
pub const GROUP_CHAT_PATH_COMMAND: &str = "get_group_chat_file_path";

fn required(body: &RequestBody, name: &str) -> Result<String, ApiError> {
    body.str_field(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {name}")))
}

fn chat_records(body: &RequestBody) -> Result<ChatPayload, ApiError> {
    let chat = body
        .field("chat")
        .ok_or_else(|| ApiError::BadRequest("missing chat".to_string()))?;
    Ok(ChatPayload::from_value(chat)?)
}

/// Materialize `payload` as JSONL and run `command` with its path as
/// `filePath`.
async fn save_through_temp_file(
    ctx: &RouterContext,
    payload: ChatPayload,
    command: &'static str,
    mut args: Map<String, Value>,
) -> Result<Value, ApiError> {
    let transfer = &ctx.config.transfer;
    let chunks = jsonl::encode_chunked(payload.records(), transfer.max_chunk_bytes)?.map(Bytes::from);
    let invoke = ctx.invoke.clone();
    debug!("Saving {} records through {}", payload.len(), command);

    let saved = with_temp_file(ctx.storage.clone(), chunks, &transfer.temp_file, |path| async move {
        args.insert("filePath".to_string(), json!(path.to_string_lossy()));
        invoke
            .invoke(command, Value::Object(args))
            .await
            .map_err(ApiError::from)
    })
    .await?;
    Ok(saved)
}

/// Resolve a chat file through `command` and decode it. `None` when the
/// native side or the file system reports it missing.
async fn load_chat_file(
    ctx: &RouterContext,
    command: &'static str,
    args: Value,
) -> Result<Option<Vec<JsonObject>>, ApiError> {
    let resolved = match ctx.invoke.invoke(command, args).await {
        Ok(value) => value,
        Err(e) if e.kind().is_not_found() => {
            debug!("{} reported no file: {}", command, e.message());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let path = match &resolved {
        Value::String(path) => path.as_str(),
        Value::Object(map) => map.get("path").and_then(Value::as_str).unwrap_or_default(),
        _ => "",
    };
    if path.is_empty() {
        return Ok(None);
    }

    let stream = match ctx.storage.open_asset_stream(&PathBuf::from(path)).await {
        Ok(stream) => stream,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(decode_stream(stream).await?))
}

/// `POST /api/chats/save`
pub async fn save_chat(ctx: Arc<RouterContext>, request: RouteRequest) -> HandlerResult {
    let body = &request.body;
    let character = required(body, "ch_name")?;
    let file_name = required(body, "file_name")?;
    let payload = chat_records(body)?;

    let mut args = Map::new();
    args.insert("characterName".to_string(), json!(character));
    args.insert("fileName".to_string(), json!(file_name));
    args.insert("force".to_string(), json!(body.bool_field("force")));
    if let Some(avatar) = body.str_field("avatar_url") {
        args.insert("avatarUrl".to_string(), json!(avatar));
    }

    save_through_temp_file(&ctx, payload, SAVE_CHAT_COMMAND, args).await?;
    info!("Saved chat {} for {}", file_name, character);
    Ok(Some(HandlerResponse::ok_json(json!({ "result": "ok" }))))
}

/// `POST /api/chats/get`. A missing chat is an empty object, which the
/// client treats as "start a new chat".
pub async fn get_chat(ctx: Arc<RouterContext>, request: RouteRequest) -> HandlerResult {
    let body = &request.body;
    let character = required(body, "ch_name")?;
    let file_name = required(body, "file_name")?;
    let args = json!({
        "characterName": character,
        "fileName": file_name,
        "avatarUrl": body.str_field("avatar_url"),
    });

    let response = match load_chat_file(&ctx, CHAT_PATH_COMMAND, args).await? {
        Some(records) => HandlerResponse::ok_json(ChatPayload::from_objects(records).into_value()),
        None => HandlerResponse::ok_json(json!({})),
    };
    Ok(Some(response))
}

/// `POST /api/chats/group/save`
pub async fn save_group_chat(ctx: Arc<RouterContext>, request: RouteRequest) -> HandlerResult {
    let body = &request.body;
    let id = required(body, "id")?;
    let payload = chat_records(body)?;

    let mut args = Map::new();
    args.insert("id".to_string(), json!(id));
    args.insert("force".to_string(), json!(body.bool_field("force")));

    save_through_temp_file(&ctx, payload, SAVE_GROUP_CHAT_COMMAND, args).await?;
    info!("Saved group chat {}", id);
    Ok(Some(HandlerResponse::ok_json(json!({ "ok": true }))))
}

/// `POST /api/chats/group/get`. A missing group chat is an empty list.
pub async fn get_group_chat(ctx: Arc<RouterContext>, request: RouteRequest) -> HandlerResult {
    let id = required(&request.body, "id")?;
    let records = load_chat_file(&ctx, GROUP_CHAT_PATH_COMMAND, json!({ "id": id }))
        .await?
        .unwrap_or_default();
    Ok(Some(HandlerResponse::ok_json(
        ChatPayload::from_objects(records).into_value(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::system::tests::{context, json_of, request};
    use crate::ports::invoke_bridge::InvokeError;
    use crate::transport::temp_file::tests::MemoryStorage;
    use crate::use_cases::stream_completion::tests::ScriptedBridge;
    use http::{Method, StatusCode};
    use std::sync::atomic::Ordering;

    fn save_body() -> RequestBody {
        RequestBody::Json(json!({
            "ch_name": "Seraphina",
            "file_name": "Seraphina - 2024-05-01",
            "avatar_url": "Seraphina.png",
            "chat": [
                {"user_name": "User", "character_name": "Seraphina"},
                {"name": "User", "mes": "hello"},
                {"name": "Seraphina", "mes": "hi"},
            ],
        }))
    }

    #[tokio::test]
    async fn save_hands_a_temp_file_to_native_and_removes_it() {
        let bridge = Arc::new(ScriptedBridge::default());
        let storage = Arc::new(MemoryStorage::default());
        let ctx = context(bridge.clone(), storage.clone());

        let response = save_chat(ctx, request(Method::POST, "/api/chats/save", save_body()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json_of(response), json!({"result": "ok"}));

        let calls = bridge.calls_to(SAVE_CHAT_COMMAND);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["characterName"], "Seraphina");
        assert_eq!(calls[0]["avatarUrl"], "Seraphina.png");
        assert_eq!(calls[0]["force"], false);
        assert!(calls[0]["filePath"].as_str().unwrap().ends_with(".jsonl"));
        assert!(storage.writes.load(Ordering::SeqCst) >= 1);
        assert!(storage.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn integrity_failure_is_distinguishable_and_cleans_up() {
        let bridge = Arc::new(ScriptedBridge::default());
        bridge.respond(
            SAVE_CHAT_COMMAND,
            Err(InvokeError::rejected(json!({"message": "Integrity check failed"}))),
        );
        let storage = Arc::new(MemoryStorage::default());
        let ctx = context(bridge, storage.clone());

        let err = save_chat(ctx, request(Method::POST, "/api/chats/save", save_body()))
            .await
            .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response)["error"], "integrity");
        assert!(storage.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_rejects_non_object_records() {
        let ctx = context(Default::default(), Default::default());
        let body = RequestBody::Json(json!({"ch_name": "a", "file_name": "b", "chat": [{}, 3]}));
        let err = save_chat(ctx, request(Method::POST, "/api/chats/save", body))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_streams_the_native_file_back() {
        let bridge = Arc::new(ScriptedBridge::default());
        bridge.respond(CHAT_PATH_COMMAND, Ok(json!("/chats/Seraphina/a.jsonl")));
        let storage = Arc::new(MemoryStorage::default());
        storage.insert(
            "/chats/Seraphina/a.jsonl",
            "\u{feff}{\"user_name\":\"User\"}\r\n{\"mes\":\"héllo\"}\n".as_bytes(),
        );
        let ctx = context(bridge.clone(), storage);

        let body = RequestBody::Json(json!({"ch_name": "Seraphina", "file_name": "a"}));
        let response = get_chat(ctx, request(Method::POST, "/api/chats/get", body))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            json_of(response),
            json!([{"user_name": "User"}, {"mes": "héllo"}])
        );
        assert_eq!(bridge.calls_to(CHAT_PATH_COMMAND)[0]["fileName"], "a");
    }

    #[tokio::test]
    async fn corrupt_stored_chat_is_a_server_error() {
        let bridge = Arc::new(ScriptedBridge::default());
        bridge.respond(CHAT_PATH_COMMAND, Ok(json!("/chats/Seraphina/torn.jsonl")));
        let storage = Arc::new(MemoryStorage::default());
        storage.insert("/chats/Seraphina/torn.jsonl", "{\"user_name\":\"User\"}\n{\"mes\":".as_bytes());
        let ctx = context(bridge, storage);

        let body = RequestBody::Json(json!({"ch_name": "Seraphina", "file_name": "torn"}));
        let err = get_chat(ctx, request(Method::POST, "/api/chats/get", body))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.into_response().status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn missing_chat_is_an_empty_object() {
        let bridge = Arc::new(ScriptedBridge::default());
        bridge.respond(CHAT_PATH_COMMAND, Err(InvokeError::rejected("No such file or directory (os error 2)")));
        let ctx = context(bridge, Default::default());
        let body = RequestBody::Json(json!({"ch_name": "a", "file_name": "b"}));
        let response = get_chat(ctx, request(Method::POST, "/api/chats/get", body))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json_of(response), json!({}));
    }

    #[tokio::test]
    async fn missing_file_on_disk_is_also_empty() {
        let bridge = Arc::new(ScriptedBridge::default());
        bridge.respond(GROUP_CHAT_PATH_COMMAND, Ok(json!({"path": "/groups/gone.jsonl"})));
        let ctx = context(bridge, Default::default());
        let body = RequestBody::Json(json!({"id": "g1"}));
        let response = get_group_chat(ctx, request(Method::POST, "/api/chats/group/get", body))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json_of(response), json!([]));
    }

    #[tokio::test]
    async fn group_save_passes_id_and_force() {
        let bridge = Arc::new(ScriptedBridge::default());
        let ctx = context(bridge.clone(), Default::default());
        let body = RequestBody::Json(json!({"id": "g1", "force": true, "chat": [{"a": 1}]}));
        let response = save_group_chat(ctx, request(Method::POST, "/api/chats/group/save", body))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json_of(response), json!({"ok": true}));
        let calls = bridge.calls_to(SAVE_GROUP_CHAT_COMMAND);
        assert_eq!(calls[0]["id"], "g1");
        assert_eq!(calls[0]["force"], true);
    }

    #[tokio::test]
    async fn missing_fields_are_bad_requests() {
        let ctx = context(Default::default(), Default::default());
        let err = get_chat(ctx, request(Method::POST, "/api/chats/get", RequestBody::Empty))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
