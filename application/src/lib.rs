//! Application layer for hearth
//!
//! This crate contains the ports, the request interception machinery, the
//! built-in route handlers and the streaming completion bridge. It depends
//! only on the domain layer.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod http;
pub mod interceptor;
pub mod ports;
pub mod routing;
pub mod transport;
pub mod use_cases;

// Re-export commonly used types
pub use config::{BridgeConfig, InterceptorParams, StreamingParams, TransferParams};
pub use context::RouterContext;
pub use error::{ApiError, HandlerResult};
pub use crate::http::{FetchError, FetchRequest, FetchResponse, HandlerResponse, RawBody, RequestBody};
pub use interceptor::{InstallOutcome, InstallReport, Interceptor, Realm, RealmEvent, RequestDispatcher};
pub use ports::{
    ajax_client::{AjaxClient, AjaxSettings},
    http_client::HttpClient,
    invoke_bridge::{EventSubscription, InvokeBridge, InvokeError, InvokeResult},
    scratch_storage::{ScratchStorage, StorageError, TempFileOptions},
    transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger},
};
pub use routing::{RouteHandler, RouteRegistry, RouteRequest, handler_fn};
pub use transport::{decode_stream, with_temp_file};
pub use use_cases::stream_completion::{CompletionStream, StreamingCompletionBridge};
