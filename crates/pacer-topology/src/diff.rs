//! Structured diffing of two topology snapshots.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::records::{NodeServiceCounts, PlacementRecord, node_service_counts, signatures};

/// Per-service changes for one node present in both snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDelta {
    /// Services whose count increased, with the positive increase.
    pub added: BTreeMap<String, u64>,
    /// Services whose count decreased, with the positive magnitude of
    /// the decrease.
    pub removed: BTreeMap<String, u64>,
    /// Signed `new - old` per service, over the union of both sides.
    pub delta: BTreeMap<String, i64>,
}

/// The structured difference between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDiff {
    pub added_nodes: BTreeSet<String>,
    pub removed_nodes: BTreeSet<String>,
    /// Nodes present in both snapshots whose service multisets differ.
    /// A node with equal multisets never appears here, regardless of
    /// record ordering in the input.
    pub changed_nodes: BTreeMap<String, NodeDelta>,
}

impl TopologyDiff {
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty() && self.removed_nodes.is_empty() && self.changed_nodes.is_empty()
    }
}

/// Outcome of comparing two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeReport {
    pub changed: bool,
    pub old_signatures: BTreeMap<String, String>,
    pub new_signatures: BTreeMap<String, String>,
    pub diff: TopologyDiff,
}

/// Compare two topology snapshots.
///
/// Total and side-effect free: well-formed lists never fail, malformed
/// records are skipped during counting.
pub fn detect_change(old: &[PlacementRecord], new: &[PlacementRecord]) -> ChangeReport {
    let old_counts = node_service_counts(old);
    let new_counts = node_service_counts(new);

    let diff = diff_counts(&old_counts, &new_counts);
    let changed = !diff.is_empty();

    if changed {
        debug!(
            added = diff.added_nodes.len(),
            removed = diff.removed_nodes.len(),
            changed_nodes = diff.changed_nodes.len(),
            "topology change detected"
        );
    }

    ChangeReport {
        changed,
        old_signatures: signatures(&old_counts),
        new_signatures: signatures(&new_counts),
        diff,
    }
}

/// Diff two per-node count maps.
fn diff_counts(old: &NodeServiceCounts, new: &NodeServiceCounts) -> TopologyDiff {
    let added_nodes: BTreeSet<String> = new
        .keys()
        .filter(|node| !old.contains_key(*node))
        .cloned()
        .collect();
    let removed_nodes: BTreeSet<String> = old
        .keys()
        .filter(|node| !new.contains_key(*node))
        .cloned()
        .collect();

    let mut changed_nodes = BTreeMap::new();
    for (node, old_services) in old {
        let Some(new_services) = new.get(node) else {
            continue;
        };

        let mut node_delta = NodeDelta::default();
        let service_union: BTreeSet<&String> =
            old_services.keys().chain(new_services.keys()).collect();

        for service in service_union {
            let before = old_services.get(service).copied().unwrap_or(0) as i64;
            let after = new_services.get(service).copied().unwrap_or(0) as i64;
            let delta = after - before;
            node_delta.delta.insert(service.clone(), delta);
            if delta > 0 {
                node_delta.added.insert(service.clone(), delta as u64);
            } else if delta < 0 {
                node_delta.removed.insert(service.clone(), (-delta) as u64);
            }
        }

        if !node_delta.added.is_empty() || !node_delta.removed.is_empty() {
            changed_nodes.insert(node.clone(), node_delta);
        }
    }

    TopologyDiff {
        added_nodes,
        removed_nodes,
        changed_nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, &str)]) -> Vec<PlacementRecord> {
        entries
            .iter()
            .map(|(node, service)| PlacementRecord::new(*node, *service))
            .collect()
    }

    #[test]
    fn count_shift_on_one_node() {
        let old = snapshot(&[("node1", "gesture"), ("node1", "gesture"), ("node1", "pose")]);
        let new = snapshot(&[("node1", "gesture"), ("node1", "pose"), ("node1", "pose")]);

        let report = detect_change(&old, &new);
        assert!(report.changed);
        assert_eq!(report.old_signatures["node1"], "node1:gesture=2,pose=1");
        assert_eq!(report.new_signatures["node1"], "node1:gesture=1,pose=2");

        let delta = &report.diff.changed_nodes["node1"];
        assert_eq!(delta.delta["gesture"], -1);
        assert_eq!(delta.delta["pose"], 1);
        assert_eq!(delta.added["pose"], 1);
        assert_eq!(delta.removed["gesture"], 1);
    }

    #[test]
    fn identical_snapshots_are_unchanged() {
        let records = snapshot(&[("node1", "gesture"), ("node1", "pose"), ("node2", "object")]);

        let report = detect_change(&records, &records);
        assert!(!report.changed);
        assert!(report.diff.is_empty());
    }

    #[test]
    fn reordered_records_compare_equal() {
        let old = snapshot(&[("node1", "gesture"), ("node1", "pose"), ("node1", "gesture")]);
        let new = snapshot(&[("node1", "pose"), ("node1", "gesture"), ("node1", "gesture")]);

        let report = detect_change(&old, &new);
        assert!(!report.changed);
        assert!(report.diff.changed_nodes.is_empty());
    }

    #[test]
    fn node_removal() {
        let old = snapshot(&[("A", "pose"), ("B", "gesture")]);
        let new = snapshot(&[("B", "gesture")]);

        let report = detect_change(&old, &new);
        assert!(report.changed);
        assert!(report.diff.removed_nodes.contains("A"));
        assert!(report.diff.added_nodes.is_empty());
        assert!(report.diff.changed_nodes.is_empty());
    }

    #[test]
    fn node_addition() {
        let old = snapshot(&[("A", "pose")]);
        let new = snapshot(&[("A", "pose"), ("B", "object")]);

        let report = detect_change(&old, &new);
        assert!(report.changed);
        assert!(report.diff.added_nodes.contains("B"));
        assert!(report.diff.removed_nodes.is_empty());
    }

    #[test]
    fn empty_old_snapshot() {
        let new = snapshot(&[("A", "pose")]);

        let report = detect_change(&[], &new);
        assert!(report.changed);
        assert_eq!(report.diff.added_nodes.len(), 1);
        assert!(report.old_signatures.is_empty());
    }

    #[test]
    fn empty_both_snapshots() {
        let report = detect_change(&[], &[]);
        assert!(!report.changed);
        assert!(report.diff.is_empty());
    }

    #[test]
    fn service_appearing_and_vanishing_on_same_node() {
        let old = snapshot(&[("node1", "gesture"), ("node1", "gesture")]);
        let new = snapshot(&[("node1", "object")]);

        let report = detect_change(&old, &new);
        let delta = &report.diff.changed_nodes["node1"];
        assert_eq!(delta.added["object"], 1);
        assert_eq!(delta.removed["gesture"], 2);
        assert_eq!(delta.delta["gesture"], -2);
        assert_eq!(delta.delta["object"], 1);
    }
}
