//! Placement records and per-node service counting.

use std::collections::BTreeMap;

use pacer_core::ThroughputKey;
use serde::{Deserialize, Serialize};

/// One placement record from a topology snapshot.
///
/// The wire form is `{nodeName, serviceType, ...}`; extra fields are
/// ignored and missing fields leave the record malformed (it is skipped
/// during counting rather than failing the snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
}

impl PlacementRecord {
    pub fn new(node: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            node_name: Some(node.into()),
            service_type: Some(service.into()),
        }
    }
}

/// Per-node service-count multisets: node → (service type → count).
pub type NodeServiceCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Group and count a snapshot's records per node.
///
/// Duplicate identical records increment the count; records with a
/// missing or empty node name or service type are dropped silently.
pub fn node_service_counts(records: &[PlacementRecord]) -> NodeServiceCounts {
    let mut counts = NodeServiceCounts::new();
    for record in records {
        let (Some(node), Some(service)) = (&record.node_name, &record.service_type) else {
            continue;
        };
        if node.is_empty() || service.is_empty() {
            continue;
        }
        *counts
            .entry(node.clone())
            .or_default()
            .entry(service.clone())
            .or_insert(0) += 1;
    }
    counts
}

/// Stable per-node signatures, `"<node>:<svc1>=<n1>,<svc2>=<n2>,..."`
/// with segments sorted by service name.
///
/// The format matches [`ThroughputKey::canonical`], so a signature can
/// be fed straight back into the throughput store as a key. Signatures
/// are for comparison and logging; lookups go through the key type.
pub fn signatures(counts: &NodeServiceCounts) -> BTreeMap<String, String> {
    counts
        .iter()
        .map(|(node, services)| {
            let key = ThroughputKey {
                node: node.clone(),
                services: services.clone(),
            };
            (node.clone(), key.canonical())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_duplicates() {
        let records = vec![
            PlacementRecord::new("node1", "gesture"),
            PlacementRecord::new("node1", "gesture"),
            PlacementRecord::new("node1", "pose"),
        ];

        let counts = node_service_counts(&records);
        assert_eq!(counts["node1"]["gesture"], 2);
        assert_eq!(counts["node1"]["pose"], 1);
    }

    #[test]
    fn skips_malformed_records() {
        let records: Vec<PlacementRecord> = serde_json::from_value(json!([
            {"nodeName": "node1", "serviceType": "pose"},
            {"nodeName": "node1"},
            {"serviceType": "gesture"},
            {"nodeName": "", "serviceType": "pose"},
            {"nodeName": "node2", "serviceType": "object", "replica": 3},
        ]))
        .unwrap();

        let counts = node_service_counts(&records);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["node1"]["pose"], 1);
        assert_eq!(counts["node2"]["object"], 1);
    }

    #[test]
    fn signatures_sort_services() {
        let records = vec![
            PlacementRecord::new("node1", "pose"),
            PlacementRecord::new("node1", "gesture"),
            PlacementRecord::new("node1", "gesture"),
        ];

        let sigs = signatures(&node_service_counts(&records));
        assert_eq!(sigs["node1"], "node1:gesture=2,pose=1");
    }

    #[test]
    fn empty_snapshot_has_no_counts() {
        assert!(node_service_counts(&[]).is_empty());
    }
}
