//! In-process publish/subscribe event bus.
//!
//! Producers publish [`Event`]s under an [`EventType`]; every subscriber
//! registered for that exact type is invoked on its own thread, and
//! [`Bus::publish`] returns once all of them have finished.

pub mod bus;
pub mod config;
mod dispatch;
pub mod event;
pub mod in_memory_bus;
mod registry;

pub use bus::{EventBus, Subscriber};
pub use config::{BusConfig, LockPolicy, PanicPolicy};
pub use event::Event;
pub use in_memory_bus::Bus;

pub use eventbus_core::{BusError, BusResult, EventType, SubscriptionHandle};
