//! Fetch-style request and response values.

use super::body::RawBody;
use super::response::{ByteStream, HandlerResponse, ResponseBody};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("response body is not valid JSON: {0}")]
    Decode(String),

    #[error("no fetch implementation is bound in realm {0}")]
    Unavailable(String),
}

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// As the caller wrote it; may be relative.
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RawBody,
    /// Abort signal; cancelling it aborts a streamed response.
    pub signal: CancellationToken,
}

impl FetchRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: RawBody::None,
            signal: CancellationToken::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// POST with a JSON text body, as `fetch(url, {body: JSON.stringify(v)})`.
    pub fn post_json(url: impl Into<String>, value: &Value) -> Self {
        Self::post(url)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(RawBody::Text(value.to_string()))
    }

    pub fn with_body(mut self, body: RawBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = signal;
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }
}

/// A response as the caller of `fetch` sees it.
#[derive(Debug)]
pub struct FetchResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl FetchResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    pub fn is_streaming(&self) -> bool {
        self.body.is_stream()
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, FetchError> {
        match self.body {
            ResponseBody::Empty => Ok(Bytes::new()),
            ResponseBody::Bytes(bytes) => Ok(bytes),
            ResponseBody::Text(text) => Ok(Bytes::from(text)),
            ResponseBody::Json(value) => Ok(Bytes::from(value.to_string())),
            ResponseBody::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| FetchError::Body(e.to_string()))?;
                    buf.extend_from_slice(&chunk);
                }
                Ok(buf.freeze())
            }
        }
    }

    pub async fn text(self) -> Result<String, FetchError> {
        if let ResponseBody::Text(text) = self.body {
            return Ok(text);
        }
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json(self) -> Result<Value, FetchError> {
        if let ResponseBody::Json(value) = self.body {
            return Ok(value);
        }
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// The body as a byte stream, whatever its representation.
    pub fn into_stream(self) -> ByteStream {
        let bytes = match self.body {
            ResponseBody::Stream(stream) => return stream,
            ResponseBody::Empty => return Box::pin(futures::stream::empty()),
            ResponseBody::Bytes(bytes) => bytes,
            ResponseBody::Text(text) => Bytes::from(text),
            ResponseBody::Json(value) => Bytes::from(value.to_string()),
        };
        Box::pin(futures::stream::once(async move { Ok(bytes) }))
    }
}

impl From<HandlerResponse> for FetchResponse {
    fn from(response: HandlerResponse) -> Self {
        FetchResponse::new(response.status, response.headers, response.body)
    }
}
