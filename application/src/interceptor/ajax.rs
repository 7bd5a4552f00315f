//! jQuery-style ajax: the intercepting wrapper, and the translation of a
//! fetch response into the ajax calling convention.

use super::dispatcher::RequestDispatcher;
use super::realm::Realm;
use crate::http::{FetchRequest, FetchResponse};
use crate::ports::ajax_client::{
    AjaxClient, AjaxData, AjaxFailure, AjaxResult, AjaxSettings, AjaxSuccess, JqXhr,
};
use crate::ports::http_client::HttpClient;
use async_trait::async_trait;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::StatusCode;
use std::sync::{Arc, Weak};

const DONE: u8 = 4;

/// Translate a response for an ajax caller.
///
/// 2xx and 304 resolve; anything else rejects with `"error"` and the
/// status text. A body that should be JSON but is not rejects with
/// `"parsererror"`. Streamed bodies are read to the end first.
pub async fn to_ajax_result(response: FetchResponse, data_type: Option<&str>) -> AjaxResult {
    let status = response.status();
    let status_text = status.canonical_reason().unwrap_or_default().to_string();
    let headers = response.headers().clone();
    let is_json_type = response
        .content_type()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
    let wants_json = match data_type {
        Some(dt) => dt.eq_ignore_ascii_case("json"),
        None => is_json_type,
    };

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            return Err(AjaxFailure {
                xhr: JqXhr {
                    status: status.as_u16(),
                    status_text,
                    ready_state: DONE,
                    headers,
                    ..JqXhr::default()
                },
                text_status: "error".to_string(),
                error_thrown: e.to_string(),
            });
        }
    };

    let response_json = if wants_json || is_json_type {
        serde_json::from_str(&text).ok()
    } else {
        None
    };
    let xhr = JqXhr {
        status: status.as_u16(),
        status_text: status_text.clone(),
        ready_state: DONE,
        response_text: text,
        response_json,
        headers,
    };

    if !(status.is_success() || status == StatusCode::NOT_MODIFIED) {
        return Err(AjaxFailure {
            xhr,
            text_status: "error".to_string(),
            error_thrown: status_text,
        });
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(AjaxSuccess {
            data: AjaxData::Text(String::new()),
            text_status: "nocontent".to_string(),
            xhr,
        });
    }

    let data = if wants_json {
        match &xhr.response_json {
            Some(value) => AjaxData::Json(value.clone()),
            None => {
                return Err(AjaxFailure {
                    xhr,
                    text_status: "parsererror".to_string(),
                    error_thrown: "Invalid JSON response".to_string(),
                });
            }
        }
    } else {
        AjaxData::Text(xhr.response_text.clone())
    };
    Ok(AjaxSuccess {
        data,
        text_status: "success".to_string(),
        xhr,
    })
}

fn fetch_request_from(settings: &mut AjaxSettings) -> FetchRequest {
    let mut request = FetchRequest::new(settings.method.clone(), settings.url.clone())
        .with_body(std::mem::take(&mut settings.data));
    request.headers = std::mem::take(&mut settings.headers);
    if let Some(content_type) = settings.content_type.as_deref()
        && let Ok(value) = HeaderValue::from_str(content_type)
    {
        request.headers.insert(CONTENT_TYPE, value);
    }
    request
}

/// Ajax implemented over a fetch client; the realm's stock `ajax`.
pub struct FetchBackedAjax {
    http: Arc<dyn HttpClient>,
}

impl FetchBackedAjax {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AjaxClient for FetchBackedAjax {
    async fn ajax(&self, mut settings: AjaxSettings) -> AjaxResult {
        let callbacks = settings.take_callbacks();
        let data_type = settings.data_type.take();
        let request = fetch_request_from(&mut settings);

        let result = match self.http.fetch(request).await {
            Ok(response) => to_ajax_result(response, data_type.as_deref()).await,
            Err(e) => Err(AjaxFailure {
                xhr: JqXhr {
                    ready_state: DONE,
                    ..JqXhr::default()
                },
                text_status: "error".to_string(),
                error_thrown: e.to_string(),
            }),
        };
        callbacks.settle(&result);
        result
    }
}

/// Serves registered same-origin routes for ajax callers and hands
/// everything else to the `ajax` it replaced.
pub struct InterceptingAjax {
    realm: Weak<Realm>,
    delegate: Arc<dyn AjaxClient>,
    dispatcher: Arc<RequestDispatcher>,
}

impl InterceptingAjax {
    pub fn new(realm: &Arc<Realm>, delegate: Arc<dyn AjaxClient>, dispatcher: Arc<RequestDispatcher>) -> Self {
        Self {
            realm: Arc::downgrade(realm),
            delegate,
            dispatcher,
        }
    }
}

#[async_trait]
impl AjaxClient for InterceptingAjax {
    async fn ajax(&self, mut settings: AjaxSettings) -> AjaxResult {
        let matched = self
            .realm
            .upgrade()
            .and_then(|realm| self.dispatcher.match_request(&realm, &settings.url, &settings.method));
        let Some(matched) = matched else {
            return self.delegate.ajax(settings).await;
        };

        let callbacks = settings.take_callbacks();
        let data_type = settings.data_type.take();
        let request = fetch_request_from(&mut settings);
        let response = self.dispatcher.dispatch(matched, request).await;

        let result = to_ajax_result(response.into(), data_type.as_deref()).await;
        callbacks.settle(&result);
        result
    }

    fn is_interceptor(&self) -> bool {
        true
    }
}
