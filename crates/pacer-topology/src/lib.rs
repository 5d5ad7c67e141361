//! pacer-topology — deterministic topology change detection.
//!
//! Takes two flat snapshots of "which service types run on which node"
//! (lists of `{nodeName, serviceType}` records), reduces each to
//! per-node service-count multisets, and computes a structured diff:
//! added nodes, removed nodes, and per-service deltas for nodes present
//! in both snapshots.
//!
//! The whole crate is pure: no I/O, no clocks, no errors for well-formed
//! input. Malformed records are skipped rather than rejected, so a
//! partially broken snapshot still produces a usable report.

pub mod diff;
pub mod records;

pub use diff::{ChangeReport, NodeDelta, TopologyDiff, detect_change};
pub use records::{NodeServiceCounts, PlacementRecord, node_service_counts, signatures};
