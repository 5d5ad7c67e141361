//! Stored value shapes.
//!
//! The durable JSON maps canonical key strings to either a bare integer
//! (the legacy scalar form) or an object of `{category: {throughput}}`:
//!
//! ```json
//! {
//!     "node1:gesture=2,pose=1": {
//!         "pose": {"throughput": 20},
//!         "gesture": {"throughput": 30}
//!     },
//!     "node1:pose=1": 50
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Throughput recorded for one category of a node's service mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryThroughput {
    pub throughput: u64,
}

/// One slot of the store: a scalar or a category mapping, never mixed.
/// A save with a category converts a scalar slot into a mapping, and a
/// save without one overwrites a mapping with a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreEntry {
    Scalar(u64),
    Categories(BTreeMap<String, CategoryThroughput>),
}

impl StoreEntry {
    pub fn category(throughput: u64, name: impl Into<String>) -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(name.into(), CategoryThroughput { throughput });
        Self::Categories(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_round_trips_as_bare_integer() {
        let entry: StoreEntry = serde_json::from_value(json!(99)).unwrap();
        assert_eq!(entry, StoreEntry::Scalar(99));
        assert_eq!(serde_json::to_value(&entry).unwrap(), json!(99));
    }

    #[test]
    fn category_mapping_round_trips() {
        let entry: StoreEntry = serde_json::from_value(json!({
            "pose": {"throughput": 20},
            "gesture": {"throughput": 30},
        }))
        .unwrap();

        let StoreEntry::Categories(categories) = &entry else {
            panic!("expected category mapping");
        };
        assert_eq!(categories["pose"].throughput, 20);
        assert_eq!(categories["gesture"].throughput, 30);
    }
}
