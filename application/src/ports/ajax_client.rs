//! Port for jQuery-style ajax clients.
//!
//! An ajax call settles either way through its callbacks (`success` or
//! `error`, then `complete`) and through the returned result, which plays
//! the role of the deferred.

use crate::http::RawBody;
use async_trait::async_trait;
use http::header::HeaderMap;
use http::Method;
use serde_json::Value;

pub type SuccessCallback = Box<dyn FnOnce(&AjaxData, &str, &JqXhr) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(&JqXhr, &str, &str) + Send>;
pub type CompleteCallback = Box<dyn FnOnce(&JqXhr, &str) + Send>;

/// Parsed response data handed to `success`.
#[derive(Debug, Clone, PartialEq)]
pub enum AjaxData {
    Json(Value),
    Text(String),
}

impl AjaxData {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            AjaxData::Json(value) => Some(value),
            AjaxData::Text(_) => None,
        }
    }
}

/// The jqXHR-like view of a finished request.
#[derive(Debug, Clone, Default)]
pub struct JqXhr {
    pub status: u16,
    pub status_text: String,
    pub ready_state: u8,
    pub response_text: String,
    pub response_json: Option<Value>,
    pub headers: HeaderMap,
}

impl JqXhr {
    pub fn get_response_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

#[derive(Debug, Clone)]
pub struct AjaxSuccess {
    pub data: AjaxData,
    pub text_status: String,
    pub xhr: JqXhr,
}

#[derive(Debug, Clone)]
pub struct AjaxFailure {
    pub xhr: JqXhr,
    /// `"error"` or `"parsererror"`.
    pub text_status: String,
    pub error_thrown: String,
}

pub type AjaxResult = Result<AjaxSuccess, AjaxFailure>;

#[derive(Default)]
pub struct AjaxCallbacks {
    pub success: Option<SuccessCallback>,
    pub error: Option<ErrorCallback>,
    pub complete: Option<CompleteCallback>,
}

impl AjaxCallbacks {
    /// Run `success` or `error`, then `complete`.
    pub fn settle(self, result: &AjaxResult) {
        let (xhr, status) = match result {
            Ok(ok) => {
                if let Some(success) = self.success {
                    success(&ok.data, &ok.text_status, &ok.xhr);
                }
                (&ok.xhr, ok.text_status.as_str())
            }
            Err(failure) => {
                if let Some(error) = self.error {
                    error(&failure.xhr, &failure.text_status, &failure.error_thrown);
                }
                (&failure.xhr, failure.text_status.as_str())
            }
        };
        if let Some(complete) = self.complete {
            complete(xhr, status);
        }
    }
}

/// Settings of one ajax call.
pub struct AjaxSettings {
    pub url: String,
    pub method: Method,
    pub data: RawBody,
    /// Expected response type (`"json"`, `"text"`); `None` guesses from
    /// the response content type.
    pub data_type: Option<String>,
    pub content_type: Option<String>,
    pub headers: HeaderMap,
    pub callbacks: AjaxCallbacks,
}

impl AjaxSettings {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            data: RawBody::None,
            data_type: None,
            content_type: None,
            headers: HeaderMap::new(),
            callbacks: AjaxCallbacks::default(),
        }
    }

    pub fn data(mut self, data: impl Into<RawBody>) -> Self {
        self.data = data.into();
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn on_success(mut self, f: impl FnOnce(&AjaxData, &str, &JqXhr) + Send + 'static) -> Self {
        self.callbacks.success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&JqXhr, &str, &str) + Send + 'static) -> Self {
        self.callbacks.error = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce(&JqXhr, &str) + Send + 'static) -> Self {
        self.callbacks.complete = Some(Box::new(f));
        self
    }

    pub fn take_callbacks(&mut self) -> AjaxCallbacks {
        std::mem::take(&mut self.callbacks)
    }
}

impl std::fmt::Debug for AjaxSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AjaxSettings")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("data_type", &self.data_type)
            .finish_non_exhaustive()
    }
}

/// An `ajax` implementation bound in a realm.
#[async_trait]
pub trait AjaxClient: Send + Sync {
    async fn ajax(&self, settings: AjaxSettings) -> AjaxResult;

    fn is_interceptor(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, AjaxSettings) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let settings = AjaxSettings::new(Method::GET, "/version")
            .on_success(move |_, status, _| a.lock().unwrap().push(format!("success:{status}")))
            .on_error(move |_, status, _| b.lock().unwrap().push(format!("error:{status}")))
            .on_complete(move |_, status| c.lock().unwrap().push(format!("complete:{status}")));
        (log, settings)
    }

    #[test]
    fn success_then_complete() {
        let (log, mut settings) = recorder();
        let result: AjaxResult = Ok(AjaxSuccess {
            data: AjaxData::Text("ok".into()),
            text_status: "success".into(),
            xhr: JqXhr::default(),
        });
        settings.take_callbacks().settle(&result);
        assert_eq!(*log.lock().unwrap(), vec!["success:success", "complete:success"]);
    }

    #[test]
    fn error_then_complete() {
        let (log, mut settings) = recorder();
        let result: AjaxResult = Err(AjaxFailure {
            xhr: JqXhr::default(),
            text_status: "error".into(),
            error_thrown: "Not Found".into(),
        });
        settings.take_callbacks().settle(&result);
        assert_eq!(*log.lock().unwrap(), vec!["error:error", "complete:error"]);
    }
}
