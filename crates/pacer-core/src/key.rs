//! Canonical composite keys for the throughput store.
//!
//! A key identifies a node together with its service-count multiset.
//! The canonical string form is `"<node>:<svc1>=<n1>,<svc2>=<n2>,..."`
//! with segments sorted by service name and zero-count services dropped;
//! a node with no non-zero services canonicalizes to just `"<node>"`.
//! Canonicalization is idempotent and independent of input ordering, so
//! any two representations of the same (node, positive service multiset)
//! address the same store slot.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node plus its service-count multiset.
///
/// `services` is a `BTreeMap` so iteration order is the canonical
/// (lexicographic) segment order for free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThroughputKey {
    pub node: String,
    #[serde(default)]
    pub services: BTreeMap<String, u64>,
}

impl ThroughputKey {
    /// A key for a node with no services yet.
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            services: BTreeMap::new(),
        }
    }

    /// Builder-style helper for tests and wiring.
    pub fn with_service(mut self, service: impl Into<String>, count: u64) -> Self {
        self.services.insert(service.into(), count);
        self
    }

    /// Render the canonical string form.
    pub fn canonical(&self) -> String {
        let parts: Vec<String> = self
            .services
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(svc, count)| format!("{svc}={count}"))
            .collect();
        if parts.is_empty() {
            return self.node.clone();
        }
        format!("{}:{}", self.node, parts.join(","))
    }

    /// Parse a string key in any segment order.
    ///
    /// Segments that are not `svc=count` with a non-negative integer
    /// count are dropped silently, mirroring how malformed topology
    /// records are skipped elsewhere. Canonicalizing an already
    /// canonical string yields the same string.
    pub fn parse(raw: &str) -> Self {
        let Some((node, rest)) = raw.split_once(':') else {
            return Self::new(raw);
        };
        let mut services = BTreeMap::new();
        for segment in rest.split(',').filter(|s| !s.is_empty()) {
            if let Some((svc, count)) = segment.split_once('=')
                && let Ok(count) = count.parse::<u64>()
            {
                services.insert(svc.to_string(), count);
            }
        }
        Self {
            node: node.to_string(),
            services,
        }
    }

    /// Decode the `payload.hash` wire value: either a `{node, services}`
    /// object or a pre-canonicalized string.
    pub fn from_payload(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::parse(s)),
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ThroughputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
