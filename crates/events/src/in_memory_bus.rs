//! In-process event bus.

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use tracing::{debug, instrument, trace, warn};

use eventbus_core::{EventType, SubscriptionHandle};

use crate::bus::{EventBus, Subscriber};
use crate::config::{BusConfig, LockPolicy};
use crate::dispatch;
use crate::registry::Registry;
use crate::Event;

/// In-process pub/sub bus with callback subscribers.
///
/// - One mutex guards the whole registry (subscriber map and handle counter)
/// - Publish fans out to one thread per subscriber and joins them all
/// - No IO, no async, no queue
///
/// Share it between threads with `Arc<Bus<D>>`.
pub struct Bus<D = serde_json::Value> {
    registry: Mutex<Registry<D>>,
    config: BusConfig,
}

impl<D> Bus<D> {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            config,
        }
    }

    pub fn config(&self) -> BusConfig {
        self.config
    }

    /// Register `subscriber` for `event_type`.
    ///
    /// Never fails. Registering the same callback twice yields two handles
    /// and two deliveries per publish.
    pub fn subscribe<F>(&self, event_type: impl Into<EventType>, subscriber: F) -> SubscriptionHandle
    where
        F: Fn(Event<D>) + Send + Sync + 'static,
    {
        self.register(event_type.into(), Arc::new(subscriber))
    }

    /// Remove the binding `handle` under `event_type`.
    ///
    /// Unknown types, unknown handles and repeated calls are no-ops. A handle
    /// paired with a different event type than it was issued under is
    /// ignored; see [`Bus::unsubscribe_handle`] for removal by handle alone.
    pub fn unsubscribe(&self, event_type: &str, handle: SubscriptionHandle) -> bool {
        let removed = self.registry().remove(event_type, handle);
        if removed {
            debug!(%event_type, %handle, "unsubscribed");
        } else {
            trace!(%event_type, %handle, "unsubscribe: no such binding");
        }
        removed
    }

    /// Remove the binding `handle` under whichever event type holds it.
    pub fn unsubscribe_handle(&self, handle: SubscriptionHandle) -> bool {
        match self.registry().remove_handle(handle) {
            Some(event_type) => {
                debug!(%event_type, %handle, "unsubscribed");
                true
            }
            None => {
                trace!(%handle, "unsubscribe: no such handle");
                false
            }
        }
    }

    /// Number of subscribers currently registered for `event_type`.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.registry().subscriber_count(event_type)
    }

    /// Event types with at least one subscriber, sorted.
    pub fn event_types(&self) -> Vec<EventType> {
        self.registry().event_types()
    }

    /// Whether no event type has any subscriber.
    pub fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }

    fn register(&self, event_type: EventType, subscriber: Subscriber<D>) -> SubscriptionHandle {
        let mut registry = self.registry();
        let handle = registry.insert(event_type.clone(), subscriber);
        debug!(%event_type, %handle, "subscribed");
        handle
    }

    // A panicking subscriber under `HoldAcrossJoin` poisons the lock while
    // unwinding out of `publish`. Publish never mutates the registry, so the
    // data behind a poisoned lock is still consistent.
    fn registry(&self) -> MutexGuard<'_, Registry<D>> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("registry lock poisoned by a subscriber panic; recovering");
                self.registry.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

impl<D> Bus<D>
where
    D: Clone + Send,
{
    /// Deliver `event` to every subscriber of `event_type` and wait for all of them.
    ///
    /// `event_type` is the routing key; it is not checked against
    /// `event.event_type()`. With no subscribers this returns immediately.
    #[instrument(level = "debug", skip(self, event), fields(source = %event.source()))]
    pub fn publish(&self, event_type: &str, event: Event<D>) {
        let registry = self.registry();
        let subscribers = registry.snapshot(event_type);

        if subscribers.is_empty() {
            trace!("no subscribers");
            return;
        }

        debug!(subscribers = subscribers.len(), "fanning out");
        let routing_key = EventType::from(event_type);

        match self.config.lock_policy {
            LockPolicy::HoldAcrossJoin => {
                dispatch::fan_out(&routing_key, &event, &subscribers, self.config.panic_policy);
                drop(registry);
            }
            LockPolicy::SnapshotThenRelease => {
                drop(registry);
                dispatch::fan_out(&routing_key, &event, &subscribers, self.config.panic_policy);
            }
        }

        trace!("all subscribers finished");
    }
}

impl<D> Default for Bus<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> core::fmt::Debug for Bus<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut out = f.debug_struct("Bus");
        out.field("config", &self.config);
        out.field("poisoned", &self.registry.is_poisoned());
        // Debug may run inside a subscriber while publish holds the lock.
        match self.registry.try_lock() {
            Ok(registry) => out.field("event_types", &registry.event_types()),
            Err(TryLockError::Poisoned(poisoned)) => {
                out.field("event_types", &poisoned.into_inner().event_types())
            }
            Err(TryLockError::WouldBlock) => out.field("event_types", &"<locked>"),
        };
        out.finish()
    }
}

impl<D> EventBus<D> for Bus<D>
where
    D: Clone + Send + 'static,
{
    fn subscribe(&self, event_type: EventType, subscriber: Subscriber<D>) -> SubscriptionHandle {
        self.register(event_type, subscriber)
    }

    fn unsubscribe(&self, event_type: &str, handle: SubscriptionHandle) -> bool {
        Bus::unsubscribe(self, event_type, handle)
    }

    fn publish(&self, event_type: &str, event: Event<D>) {
        Bus::publish(self, event_type, event)
    }
}
