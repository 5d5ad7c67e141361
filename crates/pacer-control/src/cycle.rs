//! The adjustment cycle: read-or-measure throughput, derive a
//! frequency, hand it to the dispatcher.

use pacer_core::{Event, ThroughputKey};
use tracing::{debug, info};

use crate::traits::{BoxFuture, CycleContext, EventHandler};

/// Handler for `DEPLOYMENT_CHANGE` events.
///
/// Consults the throughput store first and only probes on a miss, so a
/// replayed event for a known service mix costs no load test. Prober
/// and dispatcher failures propagate; retry policy, if any, lives in
/// those collaborators.
pub struct AdjustmentCycle;

impl EventHandler for AdjustmentCycle {
    fn handle<'a>(
        &'a self,
        event: &'a Event,
        ctx: &'a CycleContext,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let Some(hash) = event.deployment_hash() else {
                debug!(source = %event.source, "event carries no deployment key, ignoring");
                return Ok(());
            };
            let Some(key) = ThroughputKey::from_payload(hash) else {
                debug!(source = %event.source, "unrecognized deployment key shape, ignoring");
                return Ok(());
            };

            let throughput = match ctx.store.get(&key, None) {
                Some(cached) => {
                    debug!(key = %key, throughput = cached, "using cached throughput");
                    cached
                }
                None => {
                    info!(key = %key, "no cached throughput, running load test");
                    let measured = ctx.prober.load_test(&key).await?;
                    ctx.store.save(&key, measured, None)?;
                    measured
                }
            };

            let frequency = ctx.strategy.compute_frequency(throughput);
            info!(key = %key, throughput, frequency, "dispatching adjusted frequency");
            ctx.dispatcher.dispatch(frequency).await?;
            Ok(())
        })
    }
}
