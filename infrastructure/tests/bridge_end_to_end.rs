//! The request bridge wired to real adapters: an intercepted realm, the
//! built-in routes, scratch files on disk and an in-process native side.

use async_trait::async_trait;
use hearth_application::interceptor::FetchBackedAjax;
use hearth_application::ports::ajax_client::AjaxData;
use hearth_application::{
    AjaxSettings, BridgeConfig, FetchError, FetchRequest, FetchResponse, HandlerResponse,
    HttpClient, InvokeError, Realm, RouterContext,
};
use hearth_infrastructure::{LocalInvokeBridge, RuntimeKind, TempFileTransport, TransportSettings};
use http::{Method, StatusCode};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

/// Everything not served locally lands here.
#[derive(Default)]
struct OfflineNetwork {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl HttpClient for OfflineNetwork {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.seen.lock().unwrap().push(request.url.clone());
        Ok(HandlerResponse::text(StatusCode::OK, "offline").into())
    }
}

struct Harness {
    realm: Arc<Realm>,
    bridge: Arc<LocalInvokeBridge>,
    network: Arc<OfflineNetwork>,
    dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = TransportSettings {
            runtime: RuntimeKind::Sandboxed,
            cache_dir: Some(dir.path().join("cache")),
            read_chunk_bytes: 5,
            ..TransportSettings::default()
        };
        let storage = Arc::new(TempFileTransport::new(settings));
        let bridge = Arc::new(LocalInvokeBridge::new());
        let config = BridgeConfig::default()
            .with_max_chunk_bytes(16)
            .with_flush_interval(Duration::ZERO);

        let ctx = Arc::new(RouterContext::new(bridge.clone(), storage, config));
        let interceptor = ctx.build_interceptor(ctx.build_registry());

        let host = Url::parse("http://tauri.localhost/").unwrap();
        let network = Arc::new(OfflineNetwork::default());
        let realm = Arc::new(
            Realm::new("main", host.clone(), host)
                .with_fetch(network.clone())
                .with_ajax(Arc::new(FetchBackedAjax::new(network.clone()))),
        );
        let report = interceptor.install(&realm);
        assert!(report.fetch.is_active() && report.ajax.is_active());

        Self {
            realm,
            bridge,
            network,
            dir,
        }
    }

    fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    async fn post(&self, path: &str, body: Value) -> FetchResponse {
        self.realm.fetch(FetchRequest::post_json(path, &body)).await.unwrap()
    }
}

#[tokio::test]
async fn saved_chat_reaches_the_native_side_as_a_jsonl_file() {
    let harness = Harness::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    harness.bridge.register_command("save_chat_from_file", move |args| {
        let sink = sink.clone();
        async move {
            let path = args["filePath"].as_str().unwrap_or_default().to_string();
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| InvokeError::rejected(e.to_string()))?;
            sink.lock().unwrap().push((args, path, contents));
            Ok::<_, InvokeError>(Value::Null)
        }
    });

    let response = harness
        .post(
            "/api/chats/save",
            json!({
                "ch_name": "Seraphina",
                "file_name": "first meeting",
                "avatar_url": "seraphina.png",
                "chat": [
                    {"user_name": "User", "character_name": "Seraphina"},
                    {"name": "Seraphina", "mes": "Welcome to the glade."}
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json().await.unwrap(), json!({"result": "ok"}));

    let received = received.lock().unwrap();
    let (args, path, contents) = &received[0];
    assert_eq!(args["characterName"], "Seraphina");
    assert_eq!(args["fileName"], "first meeting");
    assert_eq!(args["avatarUrl"], "seraphina.png");
    assert_eq!(args["force"], false);
    assert_eq!(
        contents,
        "{\"user_name\":\"User\",\"character_name\":\"Seraphina\"}\n\
         {\"name\":\"Seraphina\",\"mes\":\"Welcome to the glade.\"}"
    );
    assert!(path.starts_with(harness.dir.path().join("cache").to_string_lossy().as_ref()));
    assert!(!std::path::Path::new(path).exists(), "scratch file is cleaned up");
    assert!(harness.network.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn integrity_rejections_surface_as_400() {
    let harness = Harness::new();
    harness.bridge.register_command("save_chat_from_file", |_| async {
        Err::<Value, _>(InvokeError::rejected("Chat integrity check failed"))
    });

    let response = harness
        .post(
            "/api/chats/save",
            json!({"ch_name": "A", "file_name": "b", "chat": [{"mes": "hi"}]}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json().await.unwrap()["error"], "integrity");
}

#[tokio::test]
async fn chats_load_from_the_path_the_native_side_reports() {
    let harness = Harness::new();
    let path = harness.write_file(
        "chat.jsonl",
        "\u{feff}{\"user_name\":\"User\"}\r\n{\"mes\":\"hello there\"}\r\n\r\n",
    );
    let reported = path.to_string_lossy().to_string();
    harness.bridge.register_command("get_chat_file_path", move |args| {
        let reported = reported.clone();
        async move {
            match args["fileName"].as_str() {
                Some("present") => Ok(json!(reported)),
                _ => Err(InvokeError::rejected("Chat file not found")),
            }
        }
    });

    let response = harness
        .post(
            "/api/chats/get",
            json!({"ch_name": "Seraphina", "file_name": "present"}),
        )
        .await;
    assert_eq!(
        response.json().await.unwrap(),
        json!([{"user_name": "User"}, {"mes": "hello there"}])
    );

    let missing = harness
        .post(
            "/api/chats/get",
            json!({"ch_name": "Seraphina", "file_name": "gone"}),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::OK);
    assert_eq!(missing.json().await.unwrap(), json!({}));
}

#[tokio::test]
async fn ajax_callers_get_the_same_routes() {
    let harness = Harness::new();
    let path = harness.write_file("group.jsonl", "{\"mes\":\"a\"}\n{\"mes\":\"b\"}\n");
    let reported = path.to_string_lossy().to_string();
    harness.bridge.register_command("get_group_chat_file_path", move |_| {
        let reported = reported.clone();
        async move { Ok(json!({ "path": reported })) }
    });

    let ok = harness
        .realm
        .ajax(
            AjaxSettings::new(Method::POST, "/api/chats/group/get")
                .data(json!({"id": "group-1"}))
                .data_type("json"),
        )
        .await
        .unwrap();
    assert_eq!(ok.data, AjaxData::Json(json!([{"mes": "a"}, {"mes": "b"}])));

    let token = harness
        .realm
        .ajax(AjaxSettings::new(Method::GET, "/csrf-token").data_type("json"))
        .await
        .unwrap();
    assert_eq!(token.data, AjaxData::Json(json!({"token": "disabled"})));
    assert!(harness.network.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn streamed_completions_arrive_as_server_sent_events() {
    let harness = Harness::new();
    let emitter = harness.bridge.emitter();
    let starts = Arc::new(Mutex::new(Vec::new()));
    let seen = starts.clone();
    harness.bridge.register_command("start_chat_completion_stream", move |args| {
        let emitter = emitter.clone();
        let seen = seen.clone();
        async move {
            let stream_id = args["streamId"].as_str().unwrap_or_default().to_string();
            let event = format!("chat-completion-stream:{stream_id}");
            seen.lock().unwrap().push(args);
            tokio::spawn(async move {
                emitter.emit(&event, json!({"type": "chunk", "data": "{\"delta\":\"Hel\"}"}));
                emitter.emit(&event, json!({"type": "chunk", "data": "{\"delta\":\"lo\"}"}));
                emitter.emit(&event, json!({"type": "done"}));
            });
            Ok(Value::Null)
        }
    });

    let response = harness
        .post(
            "/api/backends/chat-completions/generate",
            json!({"chat_completion_source": "OpenRouter", "stream": true, "messages": []}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("text/event-stream"));
    assert_eq!(
        response.text().await.unwrap(),
        "data: {\"delta\":\"Hel\"}\n\ndata: {\"delta\":\"lo\"}\n\ndata: [DONE]\n\n"
    );

    let starts = starts.lock().unwrap();
    assert_eq!(starts[0]["dto"]["chat_completion_source"], "OpenRouter");
}

#[tokio::test]
async fn non_streamed_failures_become_a_completion_body() {
    let harness = Harness::new();
    harness.bridge.register_command("generate_chat_completion", |_| async {
        Err::<Value, _>(InvokeError::rejected("rate limited"))
    });

    let response = harness
        .post(
            "/api/backends/chat-completions/generate",
            json!({"chat_completion_source": "claude", "messages": []}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json().await.unwrap();
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "claude");
    assert!(
        body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap()
            .contains("rate limited")
    );
}

#[tokio::test]
async fn user_files_stream_from_disk() {
    let harness = Harness::new();
    let path = harness.write_file("notes.txt", "remember the lanterns");
    let reported = path.to_string_lossy().to_string();
    harness.bridge.register_command("resolve_user_file_path", move |args| {
        let reported = reported.clone();
        async move {
            assert_eq!(args["relativePath"], "notes/today.txt");
            Ok(json!(reported))
        }
    });

    let response = harness
        .realm
        .fetch(FetchRequest::get("/user/files/notes/today.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.content_type().unwrap().starts_with("text/plain"));
    assert_eq!(response.text().await.unwrap(), "remember the lanterns");
}

#[tokio::test]
async fn unmatched_and_foreign_requests_reach_the_network() {
    let harness = Harness::new();
    let local = harness.realm.fetch(FetchRequest::get("/scripts/app.js")).await.unwrap();
    assert_eq!(local.text().await.unwrap(), "offline");
    harness
        .realm
        .fetch(FetchRequest::get("https://api.example.com/csrf-token"))
        .await
        .unwrap();
    harness
        .realm
        .fetch(FetchRequest::post_json("/csrf-token", &json!({})))
        .await
        .unwrap();

    let seen = harness.network.seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            "/scripts/app.js".to_string(),
            "https://api.example.com/csrf-token".to_string(),
            "/csrf-token".to_string(),
        ]
    );
}
