//! Matching intercepted requests to routes and running their handlers.

use super::realm::Realm;
use crate::http::{FetchRequest, HandlerResponse, is_same_origin, normalize_body, resolve_request_url};
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use crate::routing::{RouteRegistry, RouteRequest, SharedHandler};
use hearth_domain::RouteInfo;
use http::Method;
use http::header::CONTENT_TYPE;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};
use url::Url;

/// A request the registry claimed.
pub struct MatchedRequest {
    pub url: Url,
    pub method: Method,
    pub route: RouteInfo,
    pub wildcard: String,
    handler: SharedHandler,
}

impl std::fmt::Debug for MatchedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchedRequest")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

/// Shared by every intercepting wrapper in every realm.
pub struct RequestDispatcher {
    registry: Arc<RouteRegistry>,
    transcript: Arc<dyn TranscriptLogger>,
}

impl RequestDispatcher {
    pub fn new(registry: Arc<RouteRegistry>) -> Self {
        Self {
            registry,
            transcript: Arc::new(NoTranscriptLogger),
        }
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptLogger>) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Claim a request if it is same-origin with `realm` and a route
    /// matches. Anything else belongs to the original client.
    pub fn match_request(&self, realm: &Realm, url: &str, method: &Method) -> Option<MatchedRequest> {
        let document_url = realm.location();
        let resolved = match resolve_request_url(url, &document_url, realm.host_origin()) {
            Ok(resolved) => resolved,
            Err(e) => {
                trace!("Not intercepting unparsable url {:?}: {}", url, e);
                return None;
            }
        };
        if !is_same_origin(&resolved, &document_url, realm.host_origin()) {
            trace!("Not intercepting cross-origin request {}", resolved);
            return None;
        }

        let hit = self.registry.resolve(method.as_str(), resolved.path())?;
        Some(MatchedRequest {
            method: method.clone(),
            route: hit.route,
            wildcard: hit.wildcard_remainder,
            handler: hit.handler.clone(),
            url: resolved,
        })
    }

    /// Run the matched handler. Never fails: handler errors and empty
    /// results become error responses.
    pub async fn dispatch(&self, matched: MatchedRequest, request: FetchRequest) -> HandlerResponse {
        let started = Instant::now();
        let path = matched.url.path().to_string();
        let method = matched.method.clone();
        debug!("Dispatching {} {} to {}", method, path, matched.route.pattern);

        let content_type = request.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let raw = request.body;
        let body = normalize_body(raw.clone(), content_type);
        let request = RouteRequest {
            method: matched.method,
            url: matched.url,
            headers: request.headers,
            body,
            raw,
            route: matched.route,
            wildcard: matched.wildcard,
            signal: request.signal,
        };

        let response = match matched.handler.handle(request).await {
            Ok(Some(response)) => response,
            Ok(None) => {
                debug!("Handler for {} {} returned nothing", method, path);
                HandlerResponse::not_found_for(&path)
            }
            Err(e) => {
                warn!("Handler for {} {} failed: {}", method, path, e);
                e.into_response()
            }
        };

        self.transcript.log(TranscriptEvent::new(
            "route_dispatched",
            json!({
                "method": method.as_str(),
                "path": path,
                "status": response.status.as_u16(),
                "streaming": response.body.is_stream(),
                "elapsed_ms": started.elapsed().as_millis() as u64,
            }),
        ));
        response
    }
}
