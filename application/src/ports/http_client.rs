//! Port for fetch-style HTTP clients.

use crate::http::{FetchError, FetchRequest, FetchResponse};
use async_trait::async_trait;

/// A `fetch` implementation bound in a realm.
///
/// The outbound network client, the intercepting wrapper installed over
/// it, and test doubles all implement this.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;

    /// Marker checked before installing an interceptor, so a realm is
    /// never wrapped twice.
    fn is_interceptor(&self) -> bool {
        false
    }
}
