//! pacer.toml configuration parser.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacerConfig {
    pub daemon: Option<DaemonConfig>,
    pub store: Option<StoreConfig>,
    pub probe: Option<ProbeConfig>,
    pub strategy: Option<StrategyConfig>,
    pub metrics: Option<MetricsConfig>,
    /// Load-test agents the prober drives and the dispatcher notifies.
    pub agents: Option<Vec<AgentConfig>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub listen_port: Option<u16>,
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the durable JSON throughput file. Relative paths resolve
    /// against `daemon.data_dir`.
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Frequency increment between probe rounds (requests/sec).
    pub step: Option<u64>,
    /// Upper bound on probed frequency.
    pub max_frequency: Option<u64>,
    /// Duration of one probe round in seconds.
    pub duration_secs: Option<u64>,
    /// Simulated per-request failure rate (0.0 to 1.0).
    pub failure_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Fraction of measured throughput to dispatch as the operating
    /// frequency, e.g. 0.8 leaves 20% headroom. 1.0 means identity.
    pub headroom: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus-compatible API, `host:port`. Absent disables the
    /// latency watcher.
    pub endpoint: Option<String>,
    /// Instant query evaluated each interval (should yield seconds).
    pub latency_query: Option<String>,
    /// Latency above which a HIGH_LATENCY event is emitted, in seconds.
    pub latency_threshold: Option<f64>,
    /// Seconds between evaluations.
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    /// Control endpoint, `host:port`.
    pub endpoint: String,
    /// Extra labels forwarded to logs.
    pub labels: Option<HashMap<String, String>>,
}

impl PacerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PacerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: PacerConfig = toml::from_str(
            r#"
            [daemon]
            listen_port = 8620
            data_dir = "/var/lib/pacer"

            [store]
            file = "throughput.json"

            [probe]
            step = 10
            max_frequency = 500
            duration_secs = 10
            failure_rate = 0.05

            [strategy]
            headroom = 0.8

            [[agents]]
            name = "agent-a"
            endpoint = "10.0.0.5:9000"

            [[agents]]
            name = "agent-b"
            endpoint = "10.0.0.6:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.daemon.unwrap().listen_port, Some(8620));
        assert_eq!(config.store.unwrap().file.as_deref(), Some("throughput.json"));
        assert_eq!(config.probe.unwrap().step, Some(10));
        assert_eq!(config.agents.unwrap().len(), 2);
    }

    #[test]
    fn empty_config_is_valid() {
        let config: PacerConfig = toml::from_str("").unwrap();
        assert!(config.daemon.is_none());
        assert!(config.agents.is_none());
    }
}
