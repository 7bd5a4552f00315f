//! Request interception.
//!
//! The [`Interceptor`] replaces each realm's `fetch` and `ajax` with
//! wrappers that serve registered same-origin routes in-process and pass
//! every other request through untouched.

pub mod ajax;
pub mod dispatcher;
pub mod fetch;
pub mod install;
pub mod realm;

pub use ajax::{FetchBackedAjax, InterceptingAjax, to_ajax_result};
pub use dispatcher::{MatchedRequest, RequestDispatcher};
pub use fetch::InterceptingFetch;
pub use install::{InstallOutcome, InstallReport, Interceptor};
pub use realm::{Binding, Realm, RealmEvent, SkipReason};
