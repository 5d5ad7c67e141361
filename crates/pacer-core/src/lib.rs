//! pacer-core — shared types for the Pacer control loop.
//!
//! Holds the domain event shape, the canonical throughput key, and the
//! `pacer.toml` configuration parser. Everything here is pure data; the
//! algorithms live in `pacer-topology`, `pacer-state`, and
//! `pacer-control`.

pub mod config;
pub mod event;
pub mod key;

pub use config::PacerConfig;
pub use event::{Event, epoch_secs};
pub use key::ThroughputKey;
