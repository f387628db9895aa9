//! Event subscription registry
//!
//! In-process pub/sub keyed by [`EventKind`]. Many independent consumers share
//! one realtime connection through this registry; none of them manages the
//! connection itself.
//!
//! Dispatch is synchronous and in registration order. A panicking callback is
//! logged and skipped, the remaining callbacks still run.

use showrunner_core::{EventKind, RealtimeEvent};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, error};

/// Subscriber callback
pub type Callback = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

type ConnectHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    listeners: Mutex<HashMap<EventKind, Vec<(u64, Callback)>>>,
    next_id: AtomicU64,
    on_subscribe: Mutex<Option<ConnectHook>>,
}

impl RegistryInner {
    fn listeners(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<(u64, Callback)>>> {
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn remove(&self, kind: EventKind, id: u64) -> bool {
        let mut listeners = self.listeners();
        let Some(callbacks) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(cb_id, _)| *cb_id != id);
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            listeners.remove(&kind);
        }
        removed
    }
}

/// Shared subscription registry. Clones share the same listener table.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("kinds", &self.inner.listeners().len())
            .finish()
    }
}

impl SubscriptionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the hook run on every subscription, used for lazy connection
    pub fn set_connect_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .inner
            .on_subscribe
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Arc::new(hook));
    }

    /// Register `callback` under `kind`.
    ///
    /// The returned handle unsubscribes when [`Subscription::unsubscribe`] is
    /// called or when it is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&RealtimeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: Callback = Arc::new(callback);
        self.inner
            .listeners()
            .entry(kind)
            .or_default()
            .push((id, callback));
        debug!(kind = %kind, subscription_id = id, "Subscribed");

        let hook = self
            .inner
            .on_subscribe
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook();
        }

        Subscription {
            registry: Arc::downgrade(&self.inner),
            kind,
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Deliver `event` to every callback registered for its kind.
    ///
    /// Returns the number of callbacks that completed without panicking.
    pub fn dispatch(&self, event: &RealtimeEvent) -> usize {
        let kind = event.kind();
        // Callbacks may subscribe or unsubscribe; never call them under the lock.
        let callbacks: Vec<Callback> = match self.inner.listeners().get(&kind) {
            Some(callbacks) => callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for callback in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(ToString::to_string)
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!(kind = %kind, reason = %reason, "Error in realtime listener");
                }
            }
        }
        delivered
    }

    /// Number of callbacks registered for `kind`
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner.listeners().get(&kind).map_or(0, Vec::len)
    }

    /// Whether `kind` has an entry in the table. Empty entries are pruned.
    #[must_use]
    pub fn has_kind(&self, kind: EventKind) -> bool {
        self.inner.listeners().contains_key(&kind)
    }
}

/// Handle to one registered callback
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    kind: EventKind,
    id: u64,
    active: AtomicBool,
}

impl Subscription {
    /// Event kind this subscription listens to
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the callback. Only the first call has an effect.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.kind, self.id) {
                debug!(kind = %self.kind, subscription_id = self.id, "Unsubscribed");
            }
        }
    }

    /// Whether the callback is still registered
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showrunner_core::{EpisodeStatus, ProgressEvent, StatusEvent};
    use std::sync::atomic::AtomicUsize;

    fn progress(episode: &str) -> RealtimeEvent {
        RealtimeEvent::Progress(ProgressEvent {
            episode_id: episode.to_string(),
            phase: "scenes".to_string(),
            progress: Some(10.0),
            message: None,
        })
    }

    fn status(episode: &str) -> RealtimeEvent {
        RealtimeEvent::Status(StatusEvent {
            episode_id: episode.to_string(),
            status: EpisodeStatus::Completed,
        })
    }

    #[test]
    fn test_unsubscribe_stops_dispatch() {
        let registry = SubscriptionRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = registry.subscribe(EventKind::Progress, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&progress("ep-1"));
        sub.unsubscribe();
        registry.dispatch(&progress("ep-1"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_scoped() {
        let registry = SubscriptionRegistry::new();
        let first = registry.subscribe(EventKind::Status, |_| {});
        let second = registry.subscribe(EventKind::Status, |_| {});
        assert_eq!(registry.subscriber_count(EventKind::Status), 2);

        first.unsubscribe();
        first.unsubscribe();
        assert!(!first.is_active());
        assert_eq!(registry.subscriber_count(EventKind::Status), 1);

        drop(second);
        assert!(!registry.has_kind(EventKind::Status));
    }

    #[test]
    fn test_dispatch_matches_kind_in_order() {
        let registry = SubscriptionRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::clone(&seen);
        let b = Arc::clone(&seen);
        let _first = registry.subscribe(EventKind::Status, move |_| a.lock().unwrap().push("first"));
        let _second =
            registry.subscribe(EventKind::Status, move |_| b.lock().unwrap().push("second"));

        assert_eq!(registry.dispatch(&progress("ep-1")), 0);
        assert_eq!(registry.dispatch(&status("ep-1")), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let registry = SubscriptionRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _bad = registry.subscribe(EventKind::Progress, |_| panic!("listener blew up"));
        let _good = registry.subscribe(EventKind::Progress, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.dispatch(&progress("ep-1")), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_connect_hook_runs_on_subscribe() {
        let registry = SubscriptionRegistry::new();
        let hooks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hooks);
        registry.set_connect_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let _a = registry.subscribe(EventKind::Progress, |_| {});
        let _b = registry.subscribe(EventKind::Status, |_| {});
        assert_eq!(hooks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let registry = SubscriptionRegistry::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let sub = registry.subscribe(EventKind::Status, move |_| {
            if let Some(sub) = inner.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        assert_eq!(registry.dispatch(&status("ep-1")), 1);
        assert_eq!(registry.dispatch(&status("ep-1")), 0);
    }
}
