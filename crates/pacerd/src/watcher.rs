//! Latency watcher — periodically evaluates a PromQL latency query and
//! feeds HIGH_LATENCY events into the router when the threshold is
//! exceeded.

use std::sync::Arc;
use std::time::Duration;

use pacer_control::EventRouter;
use pacer_core::{Event, event};
use pacer_probe::MetricsClient;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct LatencyWatcher {
    client: MetricsClient,
    query: String,
    threshold: f64,
    router: Arc<EventRouter>,
}

impl LatencyWatcher {
    pub fn new(
        client: MetricsClient,
        query: impl Into<String>,
        threshold: f64,
        router: Arc<EventRouter>,
    ) -> Self {
        Self {
            client,
            query: query.into(),
            threshold,
            router,
        }
    }

    /// Poll until the shutdown signal flips. Query failures are logged
    /// and the loop keeps going; the metrics backend may come up later.
    pub async fn run(self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(query = %self.query, threshold = self.threshold, "latency watcher started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.check().await {
                        warn!(error = %e, "latency check failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("latency watcher stopping");
                    break;
                }
            }
        }
    }

    async fn check(&self) -> anyhow::Result<()> {
        let response = self.client.query(&self.query).await?;
        let Some(latency) = extract_sample(&response) else {
            debug!("latency query returned no samples");
            return Ok(());
        };

        if latency <= self.threshold {
            debug!(latency, "latency within threshold");
            return Ok(());
        }

        warn!(
            latency,
            threshold = self.threshold,
            "latency above threshold, emitting high latency event"
        );
        let payload = serde_json::json!({
            "latency": latency,
            "threshold": self.threshold,
            "query": self.query,
        });
        let high = Event::now(event::HIGH_LATENCY, payload, "latency-watcher");
        // An adjustment already in flight drops the event; the next
        // poll re-emits if latency is still high.
        self.router.dispatch(&high).await?;
        Ok(())
    }
}

/// Pull the first sample value out of an instant-query vector result.
fn extract_sample(response: &serde_json::Value) -> Option<f64> {
    response["data"]["result"]
        .get(0)?
        .get("value")?
        .get(1)?
        .as_str()?
        .parse()
        .ok()
}
