//! Global realms: the documents and windows whose `fetch`/`ajax` bindings
//! get patched.
//!
//! Each iframe and popup window is its own realm with its own bindings, so
//! patching the top-level realm does nothing for requests issued from a
//! child. Children report themselves through [`RealmEvent`]s.

use super::install::InstallOutcome;
use crate::http::{FetchError, FetchRequest, FetchResponse, effective_base};
use crate::ports::ajax_client::{AjaxClient, AjaxFailure, AjaxResult, AjaxSettings, JqXhr};
use crate::ports::http_client::HttpClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use url::Url;

/// A replaceable global binding (`window.fetch`, `$.ajax`).
pub struct Binding<T: ?Sized> {
    name: &'static str,
    slot: RwLock<Option<Arc<T>>>,
    writable: AtomicBool,
}

impl<T: ?Sized> Binding<T> {
    pub fn new(name: &'static str, value: Option<Arc<T>>) -> Self {
        Self {
            name,
            slot: RwLock::new(value),
            writable: AtomicBool::new(true),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Overwrite the binding, as page code assigning to it would.
    pub fn set(&self, value: Arc<T>) -> bool {
        if !self.is_writable() {
            return false;
        }
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(value);
        true
    }

    pub fn freeze(&self) {
        self.writable.store(false, Ordering::SeqCst);
    }

    pub fn is_writable(&self) -> bool {
        self.writable.load(Ordering::SeqCst)
    }

    /// Wrap the current value under one write lock, so a concurrent
    /// install cannot wrap twice.
    pub(crate) fn wrap(
        &self,
        is_wrapped: impl Fn(&T) -> bool,
        wrap: impl FnOnce(Arc<T>) -> Arc<T>,
    ) -> InstallOutcome {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        let Some(current) = slot.as_ref() else {
            return InstallOutcome::Skipped(SkipReason::Missing);
        };
        if is_wrapped(current) {
            return InstallOutcome::AlreadyInstalled;
        }
        if !self.is_writable() {
            return InstallOutcome::Skipped(SkipReason::ReadOnly);
        }
        let wrapped = wrap(current.clone());
        *slot = Some(wrapped);
        InstallOutcome::Installed
    }
}

/// Why a patch was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The realm's globals are not accessible from the host.
    CrossOrigin,
    /// Nothing is bound under that name.
    Missing,
    ReadOnly,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::CrossOrigin => "cross-origin realm",
            SkipReason::Missing => "binding missing",
            SkipReason::ReadOnly => "binding is read-only",
        })
    }
}

/// One document or window.
pub struct Realm {
    label: String,
    location: RwLock<Url>,
    host_origin: Url,
    cross_origin: AtomicBool,
    fetch: Binding<dyn HttpClient>,
    ajax: Binding<dyn AjaxClient>,
}

impl Realm {
    pub fn new(label: impl Into<String>, location: Url, host_origin: Url) -> Self {
        Self {
            label: label.into(),
            location: RwLock::new(location),
            host_origin,
            cross_origin: AtomicBool::new(false),
            fetch: Binding::new("fetch", None),
            ajax: Binding::new("ajax", None),
        }
    }

    pub fn with_fetch(self, client: Arc<dyn HttpClient>) -> Self {
        self.fetch.set(client);
        self
    }

    pub fn with_ajax(self, client: Arc<dyn AjaxClient>) -> Self {
        self.ajax.set(client);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fetch_binding(&self) -> &Binding<dyn HttpClient> {
        &self.fetch
    }

    pub fn ajax_binding(&self) -> &Binding<dyn AjaxClient> {
        &self.ajax
    }

    pub fn location(&self) -> Url {
        self.location.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn navigate(&self, url: Url) {
        *self.location.write().unwrap_or_else(|e| e.into_inner()) = url;
    }

    pub fn host_origin(&self) -> &Url {
        &self.host_origin
    }

    /// Mark whether the host can reach into this realm.
    pub fn set_cross_origin(&self, cross_origin: bool) {
        self.cross_origin.store(cross_origin, Ordering::SeqCst);
    }

    pub fn is_cross_origin(&self) -> bool {
        self.cross_origin.load(Ordering::SeqCst)
    }

    /// Base URL relative requests resolve against.
    pub fn base_url(&self) -> Url {
        effective_base(&self.location(), &self.host_origin)
    }

    /// Whether the host may patch this realm on behalf of `parent`.
    pub fn is_same_origin_with(&self, parent: &Realm) -> bool {
        !self.is_cross_origin() && self.base_url().origin() == parent.base_url().origin()
    }

    /// Issue a request through whatever `fetch` is currently bound.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let client = self
            .fetch
            .get()
            .ok_or_else(|| FetchError::Unavailable(self.label.clone()))?;
        client.fetch(request).await
    }

    /// Issue an ajax call through whatever `ajax` is currently bound.
    pub async fn ajax(&self, mut settings: AjaxSettings) -> AjaxResult {
        match self.ajax.get() {
            Some(client) => client.ajax(settings).await,
            None => {
                let result = Err(AjaxFailure {
                    xhr: JqXhr::default(),
                    text_status: "error".to_string(),
                    error_thrown: format!("no ajax implementation is bound in realm {}", self.label),
                });
                settings.take_callbacks().settle(&result);
                result
            }
        }
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("label", &self.label)
            .field("location", &self.location().as_str())
            .field("cross_origin", &self.is_cross_origin())
            .finish()
    }
}

/// A child realm appearing under a watched parent.
#[derive(Debug, Clone)]
pub enum RealmEvent {
    /// An iframe element was inserted.
    FrameInserted(Arc<Realm>),
    /// An iframe finished loading a document, possibly a new one.
    FrameLoaded(Arc<Realm>),
    /// A popup was opened.
    WindowOpened(Arc<Realm>),
}

impl RealmEvent {
    pub fn realm(&self) -> &Arc<Realm> {
        match self {
            RealmEvent::FrameInserted(r) | RealmEvent::FrameLoaded(r) | RealmEvent::WindowOpened(r) => r,
        }
    }
}
