//! Lifecycle Event Bus
//!
//! Best-effort structured notification channel. `emit` invokes every current
//! subscriber synchronously, in subscription order; a subscriber error is
//! caught and logged and does not prevent remaining subscribers from running.
//! Events are also appended to a bounded history (unbounded until a bound is
//! configured) queryable by kind-label prefix and by minimum timestamp.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use chrono::{DateTime, Utc};
use modwire_domain::error::Result;
use modwire_domain::events::{LifecycleEvent, LifecycleEventKind};
use tracing::warn;
use uuid::Uuid;

/// Subscriber callback signature
pub type SubscriberFn = Arc<dyn Fn(&LifecycleEvent) -> Result<()> + Send + Sync>;

struct SubscriberEntry {
    id: Uuid,
    callback: SubscriberFn,
}

type SubscriberList = RwLock<Vec<SubscriberEntry>>;

/// Synchronous fan-out bus with bounded history
pub struct LifecycleEventBus {
    subscribers: Arc<SubscriberList>,
    history: Mutex<VecDeque<LifecycleEvent>>,
    history_limit: Mutex<Option<usize>>,
}

impl LifecycleEventBus {
    /// Bus with unbounded history
    pub fn new() -> Arc<Self> {
        Self::with_history_limit(None)
    }

    /// Bus with a history bound; `None` keeps every event
    pub fn with_history_limit(limit: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            history: Mutex::new(VecDeque::new()),
            history_limit: Mutex::new(limit),
        })
    }

    /// Attach a subscriber; events are delivered in subscription order
    ///
    /// The returned guard detaches the subscriber via
    /// [`Subscription::unsubscribe`]. Dropping the guard without calling it
    /// leaves the subscriber attached.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&LifecycleEvent) -> Result<()> + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.subscribers
            .write()
            .expect("event bus subscribers poisoned")
            .push(SubscriberEntry {
                id,
                callback: Arc::new(callback),
            });
        Subscription {
            subscribers: Arc::downgrade(&self.subscribers),
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Emit an event to the history and every subscriber
    pub fn emit(&self, kind: LifecycleEventKind) {
        let event = LifecycleEvent::new(kind);
        self.record(event.clone());

        let callbacks: Vec<SubscriberFn> = self
            .subscribers
            .read()
            .expect("event bus subscribers poisoned")
            .iter()
            .map(|entry| entry.callback.clone())
            .collect();

        for callback in callbacks {
            if let Err(error) = callback(&event) {
                warn!(label = event.label(), %error, "event subscriber failed");
            }
        }
    }

    /// Reconfigure the history bound, trimming oldest events if needed
    pub fn set_history_limit(&self, limit: Option<usize>) {
        *self
            .history_limit
            .lock()
            .expect("event bus history poisoned") = limit;
        if let Some(limit) = limit {
            let mut history = self.history.lock().expect("event bus history poisoned");
            while history.len() > limit {
                history.pop_front();
            }
        }
    }

    /// Full retained history, oldest first
    pub fn history(&self) -> Vec<LifecycleEvent> {
        self.history
            .lock()
            .expect("event bus history poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Retained events whose kind label starts with `prefix`
    pub fn history_by_prefix(&self, prefix: &str) -> Vec<LifecycleEvent> {
        self.history
            .lock()
            .expect("event bus history poisoned")
            .iter()
            .filter(|event| event.label().starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Retained events emitted at or after `since`
    pub fn history_since(&self, since: DateTime<Utc>) -> Vec<LifecycleEvent> {
        self.history
            .lock()
            .expect("event bus history poisoned")
            .iter()
            .filter(|event| event.timestamp >= since)
            .cloned()
            .collect()
    }

    /// Number of attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("event bus subscribers poisoned")
            .len()
    }

    fn record(&self, event: LifecycleEvent) {
        let limit = *self
            .history_limit
            .lock()
            .expect("event bus history poisoned");
        let mut history = self.history.lock().expect("event bus history poisoned");
        history.push_back(event);
        if let Some(limit) = limit {
            while history.len() > limit {
                history.pop_front();
            }
        }
    }

}

/// Guard for one subscription
pub struct Subscription {
    subscribers: Weak<SubscriberList>,
    id: Uuid,
    active: AtomicBool,
}

impl Subscription {
    /// Detach the subscriber; idempotent, does not affect other subscribers
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Some(subscribers) = self.subscribers.upgrade() {
                subscribers
                    .write()
                    .expect("event bus subscribers poisoned")
                    .retain(|entry| entry.id != self.id);
            }
        }
    }

    /// Whether the subscriber is still attached through this guard
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
