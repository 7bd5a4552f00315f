//! The `fetch` wrapper installed in each realm.

use super::dispatcher::RequestDispatcher;
use super::realm::Realm;
use crate::http::{FetchError, FetchRequest, FetchResponse};
use crate::ports::http_client::HttpClient;
use async_trait::async_trait;
use std::sync::{Arc, Weak};

/// Serves registered same-origin routes locally and hands every other
/// request to the `fetch` it replaced.
pub struct InterceptingFetch {
    realm: Weak<Realm>,
    delegate: Arc<dyn HttpClient>,
    dispatcher: Arc<RequestDispatcher>,
}

impl InterceptingFetch {
    pub fn new(realm: &Arc<Realm>, delegate: Arc<dyn HttpClient>, dispatcher: Arc<RequestDispatcher>) -> Self {
        Self {
            realm: Arc::downgrade(realm),
            delegate,
            dispatcher,
        }
    }

    pub fn delegate(&self) -> &Arc<dyn HttpClient> {
        &self.delegate
    }
}

#[async_trait]
impl HttpClient for InterceptingFetch {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let matched = self
            .realm
            .upgrade()
            .and_then(|realm| self.dispatcher.match_request(&realm, &request.url, &request.method));
        let Some(matched) = matched else {
            return self.delegate.fetch(request).await;
        };

        let response = self.dispatcher.dispatch(matched, request).await;
        Ok(response.into())
    }

    fn is_interceptor(&self) -> bool {
        true
    }
}
