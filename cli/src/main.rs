//! CLI entrypoint for hearth
//!
//! This is the main binary that wires together all layers using
//! dependency injection. Native commands are served in process by a
//! [`LocalInvokeBridge`]; the diagnostics below register what they need.

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use clap::Parser;
use futures::StreamExt;
use hearth_application::use_cases::stream_completion::START_STREAM_COMMAND;
use hearth_application::{
    FetchRequest, NoTranscriptLogger, RawBody, Realm, RouterContext, ScratchStorage,
    TranscriptLogger, decode_stream, with_temp_file,
};
use hearth_domain::completion::STREAM_EVENT_PREFIX;
use hearth_domain::{ChatPayload, CompletionSource, JsonObject, NativeStreamEvent, jsonl};
use hearth_infrastructure::{
    ConfigLoader, FileConfig, JsonlTranscriptLogger, LocalInvokeBridge, ReqwestHttpClient,
    TempFileTransport,
};
use hearth_presentation::{
    ChunkReport, Cli, Command, ConsoleFormatter, JsonlCommand, OutputFormat, StreamCommand,
};
use http::Method;
use http::header::{CONTENT_TYPE, HeaderValue};
use serde_json::{Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are written on exit
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };
    config.validate().context("invalid configuration")?;
    info!("Starting hearth {}", env!("CARGO_PKG_VERSION"));

    // === Dependency Injection ===
    let bridge = Bridge::new(&config);
    let output = cli.output;

    match cli.command {
        Command::Routes => show_routes(&bridge, output),
        Command::Config => show_config(&config, cli.config.as_ref(), cli.no_config, output),
        Command::Jsonl(JsonlCommand::Check { file }) => check_jsonl(&bridge, &file, output).await,
        Command::Jsonl(JsonlCommand::Chunk { file, max_bytes }) => {
            chunk_jsonl(&bridge, &file, max_bytes, output).await
        }
        Command::Stream(StreamCommand::Replay { events, source }) => {
            replay_stream(&bridge, &events, &source, output).await
        }
        Command::Request { path, method, data } => {
            send_request(&bridge, &config, &path, &method, data.as_deref()).await
        }
    }
}

/// Initialize logging based on verbosity level; `RUST_LOG` wins when set.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("--log-file {} has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// The adapters one command runs against.
struct Bridge {
    context: Arc<RouterContext>,
    invoke: Arc<LocalInvokeBridge>,
    storage: Arc<TempFileTransport>,
}

impl Bridge {
    fn new(config: &FileConfig) -> Self {
        let invoke = Arc::new(LocalInvokeBridge::new());
        // No asset server runs next to the CLI, so files are read directly
        let storage = Arc::new(TempFileTransport::new(config.to_transport_settings()));
        let transcript: Arc<dyn TranscriptLogger> = match config
            .logging
            .transcript_path
            .as_ref()
            .and_then(JsonlTranscriptLogger::new)
        {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoTranscriptLogger),
        };
        let context = Arc::new(RouterContext::with_transcript(
            invoke.clone(),
            storage.clone(),
            config.to_bridge_config(),
            transcript,
        ));
        Self {
            context,
            invoke,
            storage,
        }
    }

    async fn read_chat_file(&self, file: &Path) -> Result<Vec<JsonObject>> {
        let stream = self
            .storage
            .open_asset_stream(file)
            .await
            .with_context(|| format!("cannot open {}", file.display()))?;
        decode_stream(stream)
            .await
            .with_context(|| format!("{} is not a valid chat file", file.display()))
    }
}

fn show_routes(bridge: &Bridge, output: OutputFormat) -> Result<()> {
    let routes = bridge.context.build_registry().routes();
    match output {
        OutputFormat::Text => print!("{}", ConsoleFormatter::format_routes(&routes)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::routes_json(&routes)),
    }
    Ok(())
}

fn show_config(
    config: &FileConfig,
    explicit: Option<&PathBuf>,
    no_config: bool,
    output: OutputFormat,
) -> Result<()> {
    let mut sources = ConfigLoader::sources(explicit);
    if no_config {
        sources.retain(|source| source.label == "Default");
    }
    match output {
        OutputFormat::Text => print!("{}", ConsoleFormatter::format_config(&sources, config)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::config_json(&sources, config)),
    }
    Ok(())
}

async fn check_jsonl(bridge: &Bridge, file: &Path, output: OutputFormat) -> Result<()> {
    let records = bridge.read_chat_file(file).await?;
    match output {
        OutputFormat::Text => print!("{}", ConsoleFormatter::format_jsonl_check(file, &records)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::jsonl_check_json(file, &records)),
    }
    Ok(())
}

async fn chunk_jsonl(
    bridge: &Bridge,
    file: &Path,
    max_bytes: Option<usize>,
    output: OutputFormat,
) -> Result<()> {
    let payload = ChatPayload::from_objects(bridge.read_chat_file(file).await?);
    let transfer = &bridge.context.config.transfer;
    let max_chunk_bytes = max_bytes.unwrap_or(transfer.max_chunk_bytes);

    let chunks: Vec<Vec<u8>> = jsonl::encode_chunked(payload.records(), max_chunk_bytes)?.collect();
    let chunk_sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
    let storage: Arc<dyn ScratchStorage> = bridge.storage.clone();

    let (scratch_path, file_bytes) = with_temp_file(
        storage,
        chunks.into_iter().map(Bytes::from),
        &transfer.temp_file,
        |path| async move {
            let metadata = tokio::fs::metadata(&path).await?;
            Ok::<_, std::io::Error>((path, metadata.len()))
        },
    )
    .await?;

    let report = ChunkReport {
        records: payload.len(),
        max_chunk_bytes,
        chunk_sizes,
        file_bytes,
        scratch_path: scratch_path.display().to_string(),
    };
    match output {
        OutputFormat::Text => print!("{}", ConsoleFormatter::format_chunks(&report)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::chunks_json(&report)),
    }
    Ok(())
}

/// Serve a recorded event sequence as the native side of one stream.
fn script_native_stream(invoke: &LocalInvokeBridge, mut script: Vec<Value>) {
    let terminated = script.iter().any(|event| {
        matches!(
            NativeStreamEvent::from_json(event),
            Some(NativeStreamEvent::Done | NativeStreamEvent::Error(_))
        )
    });
    if !terminated {
        warn!("Recording has no done or error event; ending the stream after it");
        script.push(json!({ "type": "done" }));
    }

    let script = Arc::new(script);
    let emitter = invoke.emitter();
    invoke.register_command(START_STREAM_COMMAND, move |args| {
        let emitter = emitter.clone();
        let script = script.clone();
        async move {
            let stream_id = args.get("streamId").and_then(Value::as_str).unwrap_or_default();
            let event = format!("{STREAM_EVENT_PREFIX}{stream_id}");
            for payload in script.iter() {
                emitter.emit(&event, payload.clone());
            }
            debug!("Replayed {} events on {}", script.len(), event);
            Ok(Value::Null)
        }
    });
}

async fn replay_stream(bridge: &Bridge, events: &Path, source: &str, output: OutputFormat) -> Result<()> {
    let text = tokio::fs::read_to_string(events)
        .await
        .with_context(|| format!("cannot read {}", events.display()))?;
    let recorded = jsonl::decode(&text).with_context(|| format!("{} is not valid JSONL", events.display()))?;
    script_native_stream(&bridge.invoke, recorded.into_iter().map(Value::Object).collect());

    let source = CompletionSource::new(source);
    let dto = json!({ "chat_completion_source": source.as_str(), "stream": true });
    let mut stream = bridge
        .context
        .completions
        .open_stream(source, dto, CancellationToken::new());

    let mut frames = Vec::new();
    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.body.next().await {
        // One write may carry several coalesced frames.
        let written = String::from_utf8_lossy(&chunk?).into_owned();
        if output == OutputFormat::Text {
            stdout.write_all(written.as_bytes())?;
            stdout.flush()?;
        }
        frames.extend(written.split_inclusive("\n\n").map(str::to_string));
    }

    if output == OutputFormat::Json {
        let report = json!({ "stream_id": stream.id, "frames": frames });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

async fn send_request(
    bridge: &Bridge,
    config: &FileConfig,
    path: &str,
    method: &str,
    data: Option<&str>,
) -> Result<()> {
    let host = config.interceptor.host_origin_url()?;
    let network = ReqwestHttpClient::new().with_base_url(host.clone());
    let realm = Arc::new(Realm::new("cli", host.clone(), host).with_fetch(Arc::new(network)));
    let interceptor = bridge.context.build_interceptor(bridge.context.build_registry());
    let outcome = interceptor.install_fetch_patch(&realm);
    debug!("fetch patch: {:?}", outcome);

    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method {method}"))?;
    let mut request = FetchRequest::new(method, path);
    if let Some(data) = data {
        serde_json::from_str::<Value>(data).context("--data is not valid JSON")?;
        request = request
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(RawBody::Text(data.to_string()));
    }

    let response = realm.fetch(request).await?;
    let status = response.status();
    eprintln!(
        "{}",
        ConsoleFormatter::format_status(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            response.content_type(),
        )
    );

    let mut body = response.into_stream();
    let mut stdout = std::io::stdout();
    while let Some(chunk) = body.next().await {
        stdout.write_all(&chunk?)?;
        stdout.flush()?;
    }
    println!();
    Ok(())
}
