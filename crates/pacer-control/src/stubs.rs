//! In-memory collaborator implementations.
//!
//! Used by tests throughout the workspace and by the daemon when no
//! agents are configured (standalone dry-run mode).

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use pacer_core::ThroughputKey;

use crate::traits::{BoxFuture, Dispatcher, Prober};

/// Prober that "measures" a fixed throughput and counts invocations.
pub struct FixedProber {
    throughput: u64,
    calls: AtomicUsize,
}

impl FixedProber {
    pub fn new(throughput: u64) -> Self {
        Self {
            throughput,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many load tests have run.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Prober for FixedProber {
    fn load_test<'a>(&'a self, _key: &'a ThroughputKey) -> BoxFuture<'a, anyhow::Result<u64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(self.throughput) })
    }
}

/// Prober whose every measurement fails.
pub struct FailingProber;

impl Prober for FailingProber {
    fn load_test<'a>(&'a self, key: &'a ThroughputKey) -> BoxFuture<'a, anyhow::Result<u64>> {
        let key = key.canonical();
        Box::pin(async move { Err(anyhow::anyhow!("load test failed for {key}")) })
    }
}

/// Dispatcher that records dispatched frequencies for inspection.
pub struct RecordingDispatcher {
    dispatched: Mutex<Vec<u64>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
        }
    }

    /// Every frequency dispatched so far, oldest first.
    pub fn dispatched(&self) -> Vec<u64> {
        match self.dispatched.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, frequency: u64) -> BoxFuture<'_, anyhow::Result<()>> {
        if let Ok(mut guard) = self.dispatched.lock() {
            guard.push(frequency);
        }
        Box::pin(async { Ok(()) })
    }
}
