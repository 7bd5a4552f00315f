//! Handler responses.

use bytes::Bytes;
use futures::stream::BoxStream;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde_json::{Value, json};

/// A stream of body bytes. Read errors end the stream.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const EVENT_STREAM: &str = "text/event-stream";

pub enum ResponseBody {
    Empty,
    Bytes(Bytes),
    Text(String),
    Json(Value),
    Stream(ByteStream),
}

impl ResponseBody {
    pub fn is_stream(&self) -> bool {
        matches!(self, ResponseBody::Stream(_))
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Empty => f.write_str("Empty"),
            ResponseBody::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            ResponseBody::Text(t) => f.debug_tuple("Text").field(t).finish(),
            ResponseBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// What a route handler produces.
#[derive(Debug)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl HandlerResponse {
    pub fn new(status: StatusCode, body: ResponseBody) -> Self {
        let mut response = Self {
            status,
            headers: HeaderMap::new(),
            body,
        };
        let default_type = match &response.body {
            ResponseBody::Json(_) => Some(APPLICATION_JSON),
            ResponseBody::Text(_) => Some(TEXT_PLAIN),
            _ => None,
        };
        if let Some(content_type) = default_type {
            response
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }

    pub fn json(status: StatusCode, value: Value) -> Self {
        Self::new(status, ResponseBody::Json(value))
    }

    pub fn ok_json(value: Value) -> Self {
        Self::json(StatusCode::OK, value)
    }

    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status, ResponseBody::Text(text.into()))
    }

    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, ResponseBody::Empty)
    }

    pub fn stream(status: StatusCode, content_type: &str, stream: ByteStream) -> Self {
        Self::new(status, ResponseBody::Stream(stream)).with_content_type(content_type)
    }

    /// `{error: message}` with the given status.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "error": message.into() }))
    }

    /// The response sent when a matched handler produced nothing.
    pub fn not_found_for(path: &str) -> Self {
        Self::json(
            StatusCode::NOT_FOUND,
            json!({ "error": format!("No handler response for {path}") }),
        )
    }

    pub fn with_content_type(self, content_type: &str) -> Self {
        match HeaderValue::from_str(content_type) {
            Ok(value) => self.with_header(CONTENT_TYPE, value),
            Err(_) => self,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_content_type() {
        let response = HandlerResponse::ok_json(json!({"token": "disabled"}));
        assert_eq!(response.content_type(), Some(APPLICATION_JSON));
        assert!(response.is_success());
    }

    #[test]
    fn not_found_names_the_path() {
        let response = HandlerResponse::not_found_for("/api/chats/get");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        match response.body {
            ResponseBody::Json(v) => assert!(v["error"].as_str().unwrap().contains("/api/chats/get")),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn stream_carries_its_type() {
        let response = HandlerResponse::stream(
            StatusCode::OK,
            EVENT_STREAM,
            Box::pin(futures::stream::empty()),
        );
        assert_eq!(response.content_type(), Some(EVENT_STREAM));
        assert!(response.body.is_stream());
    }
}
