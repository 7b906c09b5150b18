//! Event publishing/subscription abstraction.
//!
//! The bus routes events by exact [`EventType`] match to callback
//! subscribers. It makes deliberately few promises:
//!
//! - **Every subscriber registered at publish time is called once.** Nothing
//!   more: no retries, no dead-letter handling, no persistence.
//! - **No ordering** between the subscribers of one publish, nor between
//!   concurrent publishes beyond what lock serialization gives.
//! - **Synchronous publish.** There is no queue; `publish` fans out and
//!   joins before returning.

use std::sync::Arc;

use eventbus_core::{EventType, SubscriptionHandle};

use crate::Event;

/// A registered callback.
///
/// Subscribers run for side effects only. Each invocation receives its own
/// copy of the event; any state shared between subscribers needs its own
/// synchronization.
pub type Subscriber<D = serde_json::Value> = Arc<dyn Fn(Event<D>) + Send + Sync + 'static>;

/// Publish/subscribe contract.
///
/// ## Delivery
///
/// `publish` invokes every subscriber currently registered for the event
/// type, each as an independent concurrent unit of work, and blocks until
/// the last one has returned. Publishing to a type with no subscribers is a
/// successful no-op.
///
/// ## Removal
///
/// `unsubscribe` needs the event type the handle was issued under. A handle
/// paired with the wrong type is silently ignored. Removal is idempotent.
///
/// ## Thread Safety
///
/// The trait requires `Send + Sync`; all three operations may be called
/// concurrently from any number of threads. Share an implementation as
/// `Arc<dyn EventBus<D>>`.
pub trait EventBus<D = serde_json::Value>: Send + Sync {
    /// Register `subscriber` for `event_type` and return its handle.
    fn subscribe(&self, event_type: EventType, subscriber: Subscriber<D>) -> SubscriptionHandle;

    /// Remove the binding `handle` under `event_type`.
    ///
    /// Returns whether a binding was removed.
    fn unsubscribe(&self, event_type: &str, handle: SubscriptionHandle) -> bool;

    /// Deliver `event` to every subscriber of `event_type` and wait for all of them.
    fn publish(&self, event_type: &str, event: Event<D>);
}
