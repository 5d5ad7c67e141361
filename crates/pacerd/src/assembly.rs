//! Dependency assembly — builds the store, gate, collaborators, and
//! router once at startup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pacer_control::handlers::{HighLatencyHandler, IdleSystemHandler};
use pacer_control::stubs::{FixedProber, RecordingDispatcher};
use pacer_control::traits::{CycleContext, Dispatcher, FrequencyStrategy, Prober};
use pacer_control::{AdjustmentCycle, EventRouter, HeadroomStrategy, IdentityStrategy, StateGate};
use pacer_core::{PacerConfig, event};
use pacer_probe::{AgentLoadProber, HttpAgentDispatcher, ProbePlan};
use pacer_state::ThroughputStore;
use tracing::{info, warn};

/// Throughput the dry-run prober reports when no agents are configured.
const DRY_RUN_THROUGHPUT: u64 = 100;

/// Build the event router and everything behind it from configuration.
pub fn build_router(config: &PacerConfig, data_dir: &PathBuf) -> anyhow::Result<Arc<EventRouter>> {
    std::fs::create_dir_all(data_dir)?;

    let store_file = config
        .store
        .as_ref()
        .and_then(|s| s.file.clone())
        .unwrap_or_else(|| "throughput.json".to_string());
    let store_path = if PathBuf::from(&store_file).is_absolute() {
        PathBuf::from(&store_file)
    } else {
        data_dir.join(&store_file)
    };
    let store = ThroughputStore::open(&store_path)?;
    info!(path = ?store_path, entries = store.len(), "throughput store opened");

    let agents = config.agents.clone().unwrap_or_default();

    let prober: Arc<dyn Prober> = if agents.is_empty() {
        warn!("no agents configured, probing in dry-run mode");
        Arc::new(FixedProber::new(DRY_RUN_THROUGHPUT))
    } else {
        let probe = config.probe.clone().unwrap_or_default();
        let defaults = ProbePlan::default();
        let plan = ProbePlan {
            step: probe.step.unwrap_or(defaults.step),
            max_frequency: probe.max_frequency.unwrap_or(defaults.max_frequency),
            round_duration: probe
                .duration_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.round_duration),
            failure_rate: probe.failure_rate.unwrap_or(defaults.failure_rate),
        };
        Arc::new(AgentLoadProber::new(agents.clone(), plan))
    };

    let dispatcher: Arc<dyn Dispatcher> = if agents.is_empty() {
        Arc::new(RecordingDispatcher::new())
    } else {
        Arc::new(HttpAgentDispatcher::new(agents.clone()))
    };

    let headroom = config.strategy.as_ref().and_then(|s| s.headroom);
    let strategy: Arc<dyn FrequencyStrategy> = match headroom {
        Some(headroom) if headroom < 1.0 => Arc::new(HeadroomStrategy { headroom }),
        _ => Arc::new(IdentityStrategy),
    };

    let ctx = Arc::new(CycleContext {
        store,
        prober,
        strategy,
        dispatcher,
    });

    let mut router = EventRouter::new(Arc::new(StateGate::new()), ctx);
    router.register(event::DEPLOYMENT_CHANGE, Arc::new(AdjustmentCycle));
    router.register(event::HIGH_LATENCY, Arc::new(HighLatencyHandler));
    router.register(event::IDLE_SYSTEM, Arc::new(IdleSystemHandler));
    info!(agents = agents.len(), "event router assembled");

    Ok(Arc::new(router))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_core::Event;
    use serde_json::json;

    #[tokio::test]
    async fn dry_run_assembly_handles_a_change_event() {
        let dir = tempfile::tempdir().unwrap();
        let router = build_router(&PacerConfig::default(), &dir.path().to_path_buf()).unwrap();

        let event = Event::now(
            event::DEPLOYMENT_CHANGE,
            json!({"hash": {"node": "node1", "services": {"pose": 1}}}),
            "test",
        );
        let outcome = router.dispatch(&event).await.unwrap();
        assert_eq!(outcome, pacer_control::DispatchOutcome::Handled);

        // The dry-run probe result was persisted under the data dir.
        let contents = std::fs::read_to_string(dir.path().join("throughput.json")).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(raw["node1:pose=1"], DRY_RUN_THROUGHPUT);
    }
}
