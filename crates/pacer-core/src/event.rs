//! Domain events flowing from the intake bridge to the router.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event-type tag for a detected change in deployment topology.
pub const DEPLOYMENT_CHANGE: &str = "DEPLOYMENT_CHANGE";

/// Event-type tag for a latency alert from the metrics pipeline.
pub const HIGH_LATENCY: &str = "HIGH_LATENCY";

/// Event-type tag for a quiet system with no recent traffic.
pub const IDLE_SYSTEM: &str = "IDLE_SYSTEM";

/// A domain event. Constructed by the intake bridge, consumed exactly
/// once by the router; immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event-type tag. An open set; the known tags are the constants in
    /// this module, unknown tags are routed to no handler and ignored.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Free-form payload. For `DEPLOYMENT_CHANGE` the `hash` field
    /// carries a throughput key, either as a `{node, services}` object
    /// or a pre-canonicalized string.
    #[serde(default)]
    pub payload: Value,
    /// Unix timestamp (seconds) when the event was created.
    pub timestamp: u64,
    /// Tag identifying the origin (bridge, detector, test harness).
    pub source: String,
}

impl Event {
    /// Build an event stamped with the current wall-clock time.
    pub fn now(event_type: impl Into<String>, payload: Value, source: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp: epoch_secs(),
            source: source.into(),
        }
    }

    /// The `hash` field of the payload, if present.
    pub fn deployment_hash(&self) -> Option<&Value> {
        self.payload.get("hash")
    }
}

/// Current Unix time in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_wire_shape() {
        let event: Event = serde_json::from_value(json!({
            "type": "DEPLOYMENT_CHANGE",
            "payload": {"hash": {"node": "node1", "services": {"pose": 2}}},
            "timestamp": 1700000000,
            "source": "bridge",
        }))
        .unwrap();

        assert_eq!(event.event_type, DEPLOYMENT_CHANGE);
        assert_eq!(event.source, "bridge");
        assert!(event.deployment_hash().is_some());
    }

    #[test]
    fn missing_payload_defaults_to_null() {
        let event: Event = serde_json::from_value(json!({
            "type": "IDLE_SYSTEM",
            "timestamp": 0,
            "source": "test",
        }))
        .unwrap();

        assert!(event.payload.is_null());
        assert!(event.deployment_hash().is_none());
    }
}
