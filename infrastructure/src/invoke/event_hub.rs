//! Named event channels with any number of subscribers.
//!
//! The hub owns only the sending halves. Each subscriber holds an
//! [`EventSubscription`] whose drop deregisters it, the same way a session
//! channel leaves its router.

use hearth_application::ports::invoke_bridge::EventSubscription;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, trace};

type Subscribers = Vec<(u64, mpsc::UnboundedSender<Value>)>;

#[derive(Default)]
pub struct EventHub {
    /// Uses `std::sync::RwLock` so deregistration can run from `Drop`.
    routes: RwLock<HashMap<String, Subscribers>>,
    next_id: AtomicU64,
}

impl EventHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(self: &Arc<Self>, event: &str) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(event.to_string())
            .or_default()
            .push((id, tx));
        debug!("EventHub: subscriber {} listening on {}", id, event);

        let hub = Arc::downgrade(self);
        let name = event.to_string();
        EventSubscription::new(event, rx, move || {
            if let Some(hub) = hub.upgrade() {
                hub.unsubscribe(&name, id);
            }
        })
    }

    fn unsubscribe(&self, event: &str, id: u64) {
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        if let Some(subscribers) = routes.get_mut(event) {
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            if subscribers.is_empty() {
                routes.remove(event);
            }
            debug!("EventHub: subscriber {} left {}", id, event);
        }
    }

    /// Deliver `payload` to every current subscriber of `event`. Returns
    /// how many received it; events nobody listens to are dropped.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        let Some(subscribers) = routes.get(event) else {
            trace!("EventHub: no subscribers for {}", event);
            return 0;
        };
        subscribers
            .iter()
            .filter(|(_, tx)| tx.send(payload.clone()).is_ok())
            .count()
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.routes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(event)
            .map_or(0, Vec::len)
    }
}

/// Cloneable handle for publishing into a hub from native command code.
#[derive(Clone)]
pub struct EventEmitter {
    hub: Arc<EventHub>,
}

impl EventEmitter {
    pub(crate) fn new(hub: Arc<EventHub>) -> Self {
        Self { hub }
    }

    pub fn emit(&self, event: &str, payload: Value) -> usize {
        self.hub.emit(event, payload)
    }
}
