//! Installing the interceptors into realms and following child realms.

use super::ajax::InterceptingAjax;
use super::dispatcher::RequestDispatcher;
use super::fetch::InterceptingFetch;
use super::realm::{Realm, RealmEvent, SkipReason};
use crate::config::InterceptorParams;
use crate::ports::ajax_client::AjaxClient;
use crate::ports::http_client::HttpClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of patching one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// The binding already holds an interceptor.
    AlreadyInstalled,
    Skipped(SkipReason),
}

impl InstallOutcome {
    /// Whether the binding is intercepted after the call.
    pub fn is_active(&self) -> bool {
        matches!(self, InstallOutcome::Installed | InstallOutcome::AlreadyInstalled)
    }
}

/// Both patches applied to one realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallReport {
    pub fetch: InstallOutcome,
    pub ajax: InstallOutcome,
}

pub struct Interceptor {
    dispatcher: Arc<RequestDispatcher>,
    params: InterceptorParams,
}

impl Interceptor {
    pub fn new(dispatcher: Arc<RequestDispatcher>, params: InterceptorParams) -> Self {
        Self { dispatcher, params }
    }

    pub fn dispatcher(&self) -> &Arc<RequestDispatcher> {
        &self.dispatcher
    }

    /// Wrap the realm's `fetch`. Idempotent.
    pub fn install_fetch_patch(&self, realm: &Arc<Realm>) -> InstallOutcome {
        if realm.is_cross_origin() {
            return InstallOutcome::Skipped(SkipReason::CrossOrigin);
        }
        let outcome = realm.fetch_binding().wrap(
            |current| current.is_interceptor(),
            |current| {
                Arc::new(InterceptingFetch::new(realm, current, self.dispatcher.clone()))
                    as Arc<dyn HttpClient>
            },
        );
        log_outcome(realm, "fetch", outcome);
        outcome
    }

    /// Wrap the realm's `ajax`. Idempotent.
    pub fn install_ajax_patch(&self, realm: &Arc<Realm>) -> InstallOutcome {
        if realm.is_cross_origin() {
            return InstallOutcome::Skipped(SkipReason::CrossOrigin);
        }
        let outcome = realm.ajax_binding().wrap(
            |current| current.is_interceptor(),
            |current| {
                Arc::new(InterceptingAjax::new(realm, current, self.dispatcher.clone()))
                    as Arc<dyn AjaxClient>
            },
        );
        log_outcome(realm, "ajax", outcome);
        outcome
    }

    pub fn install(&self, realm: &Arc<Realm>) -> InstallReport {
        InstallReport {
            fetch: self.install_fetch_patch(realm),
            ajax: self.install_ajax_patch(realm),
        }
    }

    /// Patch child realms of `parent` as they are reported.
    ///
    /// Frames are patched on insertion and again on every load. Popups
    /// are polled until they are reachable and same-origin, or the attempt
    /// budget runs out.
    pub fn watch_child_realms(
        self: Arc<Self>,
        parent: Arc<Realm>,
        mut events: mpsc::UnboundedReceiver<RealmEvent>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };

                match event {
                    RealmEvent::FrameInserted(child) | RealmEvent::FrameLoaded(child) => {
                        if child.is_same_origin_with(&parent) {
                            self.install(&child);
                        } else {
                            debug!("Not patching cross-origin frame {}", child.label());
                        }
                    }
                    RealmEvent::WindowOpened(child) => {
                        let this = self.clone();
                        let parent = parent.clone();
                        let shutdown = shutdown.child_token();
                        tokio::spawn(async move {
                            this.poll_popup(&parent, &child, shutdown).await;
                        });
                    }
                }
            }
            debug!("Child realm watcher for {} stopped", parent.label());
        })
    }

    async fn poll_popup(&self, parent: &Realm, child: &Arc<Realm>, shutdown: CancellationToken) -> bool {
        for attempt in 1..=self.params.popup_poll_attempts {
            if child.is_same_origin_with(parent) {
                let report = self.install(child);
                debug!("Popup {} patched after {} poll(s)", child.label(), attempt);
                return report.fetch.is_active();
            }
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return false,
                _ = tokio::time::sleep(self.params.popup_poll_interval) => {}
            }
        }
        debug!(
            "Gave up on popup {} after {} polls",
            child.label(),
            self.params.popup_poll_attempts
        );
        false
    }
}

fn log_outcome(realm: &Realm, binding: &str, outcome: InstallOutcome) {
    match outcome {
        InstallOutcome::Installed => info!("Installed {} interceptor in {}", binding, realm.label()),
        InstallOutcome::AlreadyInstalled => {
            debug!("{} interceptor already present in {}", binding, realm.label())
        }
        InstallOutcome::Skipped(SkipReason::Missing) => {
            debug!("No {} binding in {}", binding, realm.label())
        }
        InstallOutcome::Skipped(reason) => {
            warn!("Could not install {} interceptor in {}: {}", binding, realm.label(), reason)
        }
    }
}
