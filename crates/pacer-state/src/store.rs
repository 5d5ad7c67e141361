//! ThroughputStore — canonical-key throughput persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use pacer_core::ThroughputKey;
use tracing::{debug, warn};

use crate::entry::{CategoryThroughput, StoreEntry};
use crate::error::{StateError, StateResult};

struct Inner {
    values: BTreeMap<String, StoreEntry>,
    /// Durable backing file; every save rewrites it whole.
    path: Option<PathBuf>,
}

/// Thread-safe throughput store with optional JSON file backing.
///
/// Keys are canonicalized on every access, so any two representations
/// of the same (node, positive service multiset) address the same slot
/// regardless of segment order or zero-count entries.
#[derive(Clone)]
pub struct ThroughputStore {
    inner: Arc<Mutex<Inner>>,
}

impl ThroughputStore {
    /// Open a store backed by the JSON file at `path`.
    ///
    /// A missing file starts the store empty; a file with unparsable
    /// contents is ignored (logged at warn) rather than failing
    /// construction. Any other read failure is an error.
    pub fn open(path: &Path) -> StateResult<Self> {
        let values = match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, StoreEntry>>(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!(?path, error = %e, "corrupt throughput data, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StateError::Open(e.to_string())),
        };

        debug!(?path, entries = values.len(), "throughput store opened");
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                values,
                path: Some(path.to_path_buf()),
            })),
        })
    }

    /// Create an ephemeral store with no backing file.
    pub fn open_in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                values: BTreeMap::new(),
                path: None,
            })),
        }
    }

    /// Create an ephemeral store seeded with existing entries, keyed by
    /// canonical strings (for tests and stub wiring).
    pub fn from_entries(entries: BTreeMap<String, StoreEntry>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                values: entries,
                path: None,
            })),
        }
    }

    /// Look up throughput for a key.
    ///
    /// With a category, the slot must hold a category mapping and that
    /// category must be present. Without one, a scalar slot returns its
    /// value and a mapping with exactly one category returns that
    /// category's throughput; a multi-category mapping is ambiguous and
    /// returns `None`.
    pub fn get(&self, key: &ThroughputKey, category: Option<&str>) -> Option<u64> {
        let inner = self.lock();
        let entry = inner.values.get(&key.canonical())?;
        match (entry, category) {
            (StoreEntry::Categories(categories), Some(category)) => {
                categories.get(category).map(|c| c.throughput)
            }
            (StoreEntry::Scalar(_), Some(_)) => None,
            (StoreEntry::Scalar(value), None) => Some(*value),
            (StoreEntry::Categories(categories), None) => {
                if categories.len() == 1 {
                    categories.values().next().map(|c| c.throughput)
                } else {
                    None
                }
            }
        }
    }

    /// Record throughput for a key and rewrite the backing file.
    ///
    /// Without a category the slot becomes a bare scalar, replacing any
    /// prior mapping. With one, the slot becomes (or stays) a mapping
    /// and only that category is updated.
    pub fn save(
        &self,
        key: &ThroughputKey,
        throughput: u64,
        category: Option<&str>,
    ) -> StateResult<()> {
        let canonical = key.canonical();
        let mut inner = self.lock();

        match category {
            None => {
                inner.values.insert(canonical.clone(), StoreEntry::Scalar(throughput));
            }
            Some(category) => {
                let entry = inner
                    .values
                    .entry(canonical.clone())
                    .or_insert_with(|| StoreEntry::Categories(BTreeMap::new()));
                if let StoreEntry::Scalar(_) = entry {
                    *entry = StoreEntry::Categories(BTreeMap::new());
                }
                if let StoreEntry::Categories(categories) = entry {
                    categories.insert(category.to_string(), CategoryThroughput { throughput });
                }
            }
        }

        debug!(key = %canonical, throughput, ?category, "throughput saved");
        persist(&inner)
    }

    /// Number of stored slots.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            // A poisoned lock only means a writer panicked; the map is
            // still a consistent snapshot of completed saves.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Rewrite the whole backing file via temp file + rename.
fn persist(inner: &Inner) -> StateResult<()> {
    let Some(path) = &inner.path else {
        return Ok(());
    };

    let json = serde_json::to_string_pretty(&inner.values)
        .map_err(|e| StateError::Serialize(e.to_string()))?;

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json).map_err(|e| StateError::Write(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| StateError::Write(e.to_string()))?;
    Ok(())
}
