//! `eventbus-core`: shared building blocks for the event bus.
//!
//! This crate contains plain value types and the error model (no dispatch logic).

pub mod error;
pub mod id;

pub use error::{BusError, BusResult};
pub use id::{EventType, SubscriptionHandle};
