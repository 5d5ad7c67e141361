//! Simulated agent-load probing.
//!
//! Measures the sustainable request frequency for a deployment key by
//! stepping the frequency upward and driving one paced round of
//! simulated requests per agent at each step. A round passes when at
//! least 90% of an agent's requests succeed and at least 80% of agents
//! pass; the highest passing frequency is reported as the measured
//! throughput.

use std::time::Duration;

use pacer_control::traits::{BoxFuture, Prober};
use pacer_core::ThroughputKey;
use pacer_core::config::AgentConfig;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Per-request success threshold for one agent's round.
const AGENT_SUCCESS_THRESHOLD: f64 = 0.9;

/// Fraction of agents that must pass a round.
const ROUND_SUCCESS_THRESHOLD: f64 = 0.8;

/// How a probe steps and paces its rounds.
#[derive(Debug, Clone)]
pub struct ProbePlan {
    /// Frequency increment between rounds (requests/sec).
    pub step: u64,
    /// Upper bound on probed frequency.
    pub max_frequency: u64,
    /// Wall-clock length of one round.
    pub round_duration: Duration,
    /// Simulated per-request failure rate, 0.0 to 1.0. Failures are
    /// scheduled deterministically (every `round(1/rate)`-th request)
    /// so probe results are reproducible.
    pub failure_rate: f64,
}

impl Default for ProbePlan {
    fn default() -> Self {
        Self {
            step: 10,
            max_frequency: 500,
            round_duration: Duration::from_secs(10),
            failure_rate: 0.05,
        }
    }
}

impl ProbePlan {
    /// Requests between two scheduled failures, if any.
    fn failure_period(&self) -> Option<u64> {
        if self.failure_rate <= 0.0 {
            return None;
        }
        Some(((1.0 / self.failure_rate).round() as u64).max(1))
    }
}

/// Prober that drives simulated load against the configured agents.
pub struct AgentLoadProber {
    agents: Vec<AgentConfig>,
    plan: ProbePlan,
}

impl AgentLoadProber {
    pub fn new(agents: Vec<AgentConfig>, plan: ProbePlan) -> Self {
        Self { agents, plan }
    }

    /// Run one round at `frequency` across all agents.
    async fn test_frequency(&self, frequency: u64, key: &ThroughputKey) -> bool {
        let interval = Duration::from_secs_f64(1.0 / frequency.max(1) as f64);
        let failure_period = self.plan.failure_period();
        let duration = self.plan.round_duration;

        let mut rounds = JoinSet::new();
        for agent in &self.agents {
            let name = agent.name.clone();
            rounds.spawn(async move {
                simulate_agent_round(name, interval, duration, failure_period).await
            });
        }

        let total = self.agents.len();
        let mut passed = 0usize;
        while let Some(outcome) = rounds.join_next().await {
            if matches!(outcome, Ok(true)) {
                passed += 1;
            }
        }

        let pass = passed as f64 / total as f64 >= ROUND_SUCCESS_THRESHOLD;
        debug!(key = %key, frequency, passed, total, pass, "probe round finished");
        pass
    }
}

impl Prober for AgentLoadProber {
    fn load_test<'a>(&'a self, key: &'a ThroughputKey) -> BoxFuture<'a, anyhow::Result<u64>> {
        Box::pin(async move {
            if self.agents.is_empty() {
                anyhow::bail!("no load-test agents configured");
            }

            info!(key = %key, agents = self.agents.len(), "load test starting");
            let mut passing = 0u64;
            let mut frequency = self.plan.step.max(1);

            while frequency <= self.plan.max_frequency {
                if !self.test_frequency(frequency, key).await {
                    break;
                }
                passing = frequency;
                frequency += self.plan.step.max(1);
            }

            if passing == 0 {
                warn!(key = %key, "agents failed at the lowest probed frequency");
            }
            info!(key = %key, throughput = passing, "load test finished");
            Ok(passing)
        })
    }
}

/// One agent's paced request round. Returns whether the agent kept a
/// 90% success rate for the whole round.
async fn simulate_agent_round(
    agent: String,
    interval: Duration,
    duration: Duration,
    failure_period: Option<u64>,
) -> bool {
    let started = Instant::now();
    let mut total = 0u64;
    let mut succeeded = 0u64;

    while started.elapsed() < duration {
        total += 1;
        if !is_scheduled_failure(total, failure_period) {
            succeeded += 1;
        }
        tokio::time::sleep(interval).await;
    }

    if total == 0 {
        return false;
    }
    let rate = succeeded as f64 / total as f64;
    debug!(agent = %agent, total, succeeded, rate, "agent round finished");
    rate >= AGENT_SUCCESS_THRESHOLD
}

fn is_scheduled_failure(request_index: u64, failure_period: Option<u64>) -> bool {
    match failure_period {
        Some(period) => request_index % period == 0,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_control::traits::Prober;

    fn agents(n: usize) -> Vec<AgentConfig> {
        (0..n)
            .map(|i| AgentConfig {
                name: format!("agent-{i}"),
                endpoint: format!("127.0.0.1:{}", 9000 + i),
                labels: None,
            })
            .collect()
    }

    fn fast_plan(failure_rate: f64) -> ProbePlan {
        ProbePlan {
            step: 50,
            max_frequency: 100,
            round_duration: Duration::from_millis(100),
            failure_rate,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_agents_reach_max_frequency() {
        let prober = AgentLoadProber::new(agents(3), fast_plan(0.05));
        let key = ThroughputKey::parse("node1:pose=1");

        let throughput = prober.load_test(&key).await.unwrap();
        assert_eq!(throughput, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn flaky_agents_fail_the_first_round() {
        // Every second request fails: 50% success rate, below threshold.
        let prober = AgentLoadProber::new(agents(3), fast_plan(0.5));
        let key = ThroughputKey::parse("node1:pose=1");

        let throughput = prober.load_test(&key).await.unwrap();
        assert_eq!(throughput, 0);
    }

    #[tokio::test]
    async fn no_agents_is_an_error() {
        let prober = AgentLoadProber::new(Vec::new(), fast_plan(0.0));
        let key = ThroughputKey::parse("node1:pose=1");

        assert!(prober.load_test(&key).await.is_err());
    }

    #[test]
    fn failure_schedule_matches_rate() {
        let plan = fast_plan(0.05);
        let period = plan.failure_period().unwrap();
        assert_eq!(period, 20);

        let failures = (1..=100)
            .filter(|i| is_scheduled_failure(*i, Some(period)))
            .count();
        assert_eq!(failures, 5);
    }

    #[test]
    fn zero_failure_rate_never_fails() {
        let plan = fast_plan(0.0);
        assert!(plan.failure_period().is_none());
        assert!(!is_scheduled_failure(7, None));
    }
}
