//! Capability traits for the external collaborators of an adjustment
//! cycle, plus the context bundle handed to handlers.
//!
//! Each collaborator is one narrow interface: the prober measures
//! throughput, the strategy derives a frequency, the dispatcher pushes
//! it to agents. Async methods use the boxed-future form so the traits
//! stay object-safe.

use std::sync::Arc;

use pacer_core::{Event, ThroughputKey};
use pacer_state::ThroughputStore;

pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Measures sustainable throughput for a deployment key. Potentially
/// slow I/O; failure propagates as the cycle's failure.
pub trait Prober: Send + Sync {
    fn load_test<'a>(&'a self, key: &'a ThroughputKey) -> BoxFuture<'a, anyhow::Result<u64>>;
}

/// Pushes an adjusted operating frequency to the external agents.
/// Fire-and-forget from the cycle's perspective, but failure propagates.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, frequency: u64) -> BoxFuture<'_, anyhow::Result<()>>;
}

/// Derives an operating frequency from a measured throughput. Pure.
pub trait FrequencyStrategy: Send + Sync {
    fn compute_frequency(&self, throughput: u64) -> u64;
}

/// One registered event handler. Runs with the state gate held.
pub trait EventHandler: Send + Sync {
    fn handle<'a>(
        &'a self,
        event: &'a Event,
        ctx: &'a CycleContext,
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// The collaborators an adjustment cycle consults. Assembled once at
/// startup and shared by reference with every handler invocation.
#[derive(Clone)]
pub struct CycleContext {
    pub store: ThroughputStore,
    pub prober: Arc<dyn Prober>,
    pub strategy: Arc<dyn FrequencyStrategy>,
    pub dispatcher: Arc<dyn Dispatcher>,
}
