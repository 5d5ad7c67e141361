//! pacer-probe — adapters for the control loop's external collaborators.
//!
//! - [`prober`]: measures sustainable throughput by stepping request
//!   frequency against simulated load-test agents until the success
//!   criterion fails.
//! - [`dispatch`]: pushes the adjusted frequency to each agent's
//!   control endpoint over HTTP.
//! - [`metrics`]: thin query client for a Prometheus-compatible HTTP
//!   API, used to enrich latency events.
//!
//! None of these implement retry or backoff; a failure surfaces as the
//! failure of the adjustment cycle that invoked them.

pub mod dispatch;
pub mod metrics;
pub mod prober;

pub use dispatch::HttpAgentDispatcher;
pub use metrics::MetricsClient;
pub use prober::{AgentLoadProber, ProbePlan};
