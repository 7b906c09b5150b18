use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventbus_core::EventType;

/// Something that happened, as handed to subscribers.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **payload-agnostic**: the bus routes on `event_type` only and never
///   inspects `data`
/// - **not stored**: the bus passes them through and forgets them
///
/// The payload defaults to [`serde_json::Value`] for callers that want an
/// untyped, caller-defined shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<D = serde_json::Value> {
    #[serde(rename = "type")]
    event_type: EventType,
    timestamp: DateTime<Utc>,
    source: String,
    data: D,
}

impl<D> Event<D> {
    /// Create an event stamped with the current time.
    pub fn new(event_type: impl Into<EventType>, source: impl Into<String>, data: D) -> Self {
        Self::at(event_type, Utc::now(), source, data)
    }

    /// Create an event with an explicit timestamp.
    pub fn at(
        event_type: impl Into<EventType>,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
        data: D,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp,
            source: source.into(),
            data,
        }
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn into_data(self) -> D {
        self.data
    }
}
