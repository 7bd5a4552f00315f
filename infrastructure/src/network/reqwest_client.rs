//! Network `fetch` over reqwest.
//!
//! The pass-through delegate for everything the interceptor does not
//! claim, and the asset reader on desktop runtimes.

use async_trait::async_trait;
use futures::StreamExt;
use hearth_application::http::{FetchError, FetchRequest, FetchResponse, FormValue, RawBody, ResponseBody};
use hearth_application::ports::http_client::HttpClient;
use http::header::{CONTENT_TYPE, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

pub struct ReqwestHttpClient {
    client: reqwest::Client,
    /// Relative URLs resolve against this.
    base_url: Option<Url>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    fn resolve(&self, raw: &str) -> Result<Url, FetchError> {
        let parsed = match &self.base_url {
            Some(base) => base.join(raw),
            None => Url::parse(raw),
        };
        parsed.map_err(|e| FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })
    }

    fn build(&self, request: FetchRequest) -> Result<reqwest::RequestBuilder, FetchError> {
        let url = self.resolve(&request.url)?;
        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);
        builder = match request.body {
            RawBody::None => builder,
            RawBody::Text(text) => builder.body(text),
            RawBody::Bytes(bytes) => builder.body(bytes),
            RawBody::Blob {
                bytes,
                content_type,
            } => {
                let builder = builder.body(bytes);
                match content_type.as_deref().map(HeaderValue::from_str) {
                    Some(Ok(value)) => builder.header(CONTENT_TYPE, value),
                    _ => builder,
                }
            }
            RawBody::Json(value) => builder.json(&value),
            RawBody::UrlEncoded(pairs) => builder.form(&pairs),
            RawBody::FormData(form) => builder.multipart(multipart_form(form.entries())?),
        };
        Ok(builder)
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn multipart_form(entries: &[(String, FormValue)]) -> Result<Form, FetchError> {
    let mut form = Form::new();
    for (name, value) in entries {
        form = match value {
            FormValue::Text(text) => form.text(name.clone(), text.clone()),
            FormValue::File {
                file_name,
                content_type,
                bytes,
            } => {
                let mut part = Part::bytes(bytes.to_vec());
                if let Some(file_name) = file_name {
                    part = part.file_name(file_name.clone());
                }
                if let Some(content_type) = content_type {
                    part = part
                        .mime_str(content_type)
                        .map_err(|e| FetchError::Network(e.to_string()))?;
                }
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let signal = request.signal.clone();
        debug!("Network fetch {} {}", request.method, request.url);
        let builder = self.build(request)?;

        let response = tokio::select! {
            biased;
            _ = signal.cancelled() => return Err(FetchError::Network("request aborted".to_string())),
            response = builder.send() => response.map_err(|e| FetchError::Network(e.to_string()))?,
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .take_until(async move { signal.cancelled().await });
        Ok(FetchResponse::new(status, headers, ResponseBody::Stream(Box::pin(body))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_application::http::FormData;
    use serde_json::json;

    #[test]
    fn relative_urls_need_a_base() {
        let client = ReqwestHttpClient::new();
        assert!(matches!(
            client.resolve("/csrf-token"),
            Err(FetchError::InvalidUrl { .. })
        ));
        let client = client.with_base_url(Url::parse("http://localhost:8000/").unwrap());
        assert_eq!(
            client.resolve("/csrf-token").unwrap().as_str(),
            "http://localhost:8000/csrf-token"
        );
    }

    #[test]
    fn json_bodies_carry_their_type() {
        let client = ReqwestHttpClient::new();
        let request = client
            .build(FetchRequest::post("http://localhost/x").with_body(RawBody::Json(json!({"a": 1}))))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn multipart_forms_are_built() {
        let client = ReqwestHttpClient::new();
        let form = FormData::new()
            .with_text("name", "avatar")
            .with_file("file", "a.png", Some("image/png"), vec![1u8, 2, 3]);
        let request = client
            .build(FetchRequest::post("http://localhost/upload").with_body(RawBody::FormData(form)))
            .unwrap()
            .build()
            .unwrap();
        let content_type = request.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn aborted_requests_fail_fast() {
        let client = ReqwestHttpClient::new();
        let request = FetchRequest::get("http://127.0.0.1:9/never");
        request.signal.cancel();
        let err = client.fetch(request).await.unwrap_err();
        assert_eq!(err, FetchError::Network("request aborted".into()));
    }
}
