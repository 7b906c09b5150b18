//! Subscription registry: event type -> handle -> subscriber.

use std::collections::HashMap;

use eventbus_core::{EventType, SubscriptionHandle};

use crate::Subscriber;

/// Subscribers indexed by event type, plus the handle counter.
///
/// Invariants:
/// - an event type has an entry iff it has at least one subscriber
/// - handles are unique across all event types and never reissued
pub(crate) struct Registry<D> {
    last_handle: u64,
    subscribers: HashMap<EventType, HashMap<SubscriptionHandle, Subscriber<D>>>,
}

impl<D> Registry<D> {
    pub(crate) fn new() -> Self {
        Self {
            last_handle: 0,
            subscribers: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, event_type: EventType, subscriber: Subscriber<D>) -> SubscriptionHandle {
        self.last_handle += 1;
        let handle = SubscriptionHandle::from_u64(self.last_handle);

        self.subscribers
            .entry(event_type)
            .or_default()
            .insert(handle, subscriber);

        handle
    }

    /// Remove `handle` from `event_type`, pruning the type if it becomes empty.
    pub(crate) fn remove(&mut self, event_type: &str, handle: SubscriptionHandle) -> bool {
        let Some(bindings) = self.subscribers.get_mut(event_type) else {
            return false;
        };

        let removed = bindings.remove(&handle).is_some();
        if bindings.is_empty() {
            self.subscribers.remove(event_type);
        }
        removed
    }

    /// Remove `handle` from whichever event type holds it.
    pub(crate) fn remove_handle(&mut self, handle: SubscriptionHandle) -> Option<EventType> {
        let event_type = self
            .subscribers
            .iter()
            .find(|(_, bindings)| bindings.contains_key(&handle))
            .map(|(event_type, _)| event_type.clone())?;

        self.remove(event_type.as_str(), handle);
        Some(event_type)
    }

    /// Copy out the current subscribers of `event_type`.
    pub(crate) fn snapshot(&self, event_type: &str) -> Vec<(SubscriptionHandle, Subscriber<D>)> {
        self.subscribers
            .get(event_type)
            .map(|bindings| {
                bindings
                    .iter()
                    .map(|(handle, subscriber)| (*handle, subscriber.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers.get(event_type).map_or(0, HashMap::len)
    }

    pub(crate) fn event_types(&self) -> Vec<EventType> {
        let mut types: Vec<EventType> = self.subscribers.keys().cloned().collect();
        types.sort();
        types
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
