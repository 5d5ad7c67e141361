//! Log-only handlers for event types that trigger no adjustment yet.

use pacer_core::Event;
use tracing::info;

use crate::traits::{BoxFuture, CycleContext, EventHandler};

/// Acknowledges `HIGH_LATENCY` events. Latency-driven adjustment is not
/// wired up yet; the event is logged so operators see it arrived.
pub struct HighLatencyHandler;

impl EventHandler for HighLatencyHandler {
    fn handle<'a>(
        &'a self,
        event: &'a Event,
        _ctx: &'a CycleContext,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            info!(source = %event.source, payload = %event.payload, "high latency event received");
            Ok(())
        })
    }
}

/// Acknowledges `IDLE_SYSTEM` events.
pub struct IdleSystemHandler;

impl EventHandler for IdleSystemHandler {
    fn handle<'a>(
        &'a self,
        event: &'a Event,
        _ctx: &'a CycleContext,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            info!(source = %event.source, payload = %event.payload, "idle system event received");
            Ok(())
        })
    }
}
