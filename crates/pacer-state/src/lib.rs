//! pacer-state — the throughput store.
//!
//! Maps canonical composite keys (node + sorted service-count multiset,
//! see `pacer_core::ThroughputKey`) to measured throughput: either a
//! bare scalar or a per-category mapping. Optionally backed by a JSON
//! file that is rewritten whole (atomically, via temp file + rename)
//! after every save.
//!
//! The store is `Clone + Send + Sync` (backed by `Arc<Mutex<..>>`) and
//! serializes its own access; callers need no external locking.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{CategoryThroughput, StoreEntry};
pub use error::{StateError, StateResult};
pub use store::ThroughputStore;
