//! Thin query client for a Prometheus-compatible HTTP API.

use std::time::Duration;

use anyhow::Context;
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use tracing::debug;
use urlencoding::encode;

/// Executes instant PromQL queries against `/api/v1/query`.
///
/// The endpoint is a bare authority (`host:port`). No retry; a failed
/// query surfaces to the caller.
pub struct MetricsClient {
    endpoint: String,
    timeout: Duration,
}

impl MetricsClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one instant query and return the parsed JSON response.
    pub async fn query(&self, promql: &str) -> anyhow::Result<serde_json::Value> {
        let uri = format!(
            "http://{}/api/v1/query?query={}",
            self.endpoint,
            encode(promql)
        );
        debug!(endpoint = %self.endpoint, query = promql, "metrics query");

        let request = async {
            let stream = tokio::net::TcpStream::connect(&self.endpoint)
                .await
                .context("connect failed")?;
            let io = TokioIo::new(stream);
            let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
                .await
                .context("handshake failed")?;

            tokio::spawn(async move {
                let _ = conn.await;
            });

            let req = http::Request::builder()
                .method("GET")
                .uri(&uri)
                .header("host", &self.endpoint)
                .body(Empty::<bytes::Bytes>::new())
                .context("failed to build request")?;

            let resp = sender.send_request(req).await.context("query failed")?;
            anyhow::ensure!(
                resp.status().is_success(),
                "metrics API returned {}",
                resp.status()
            );

            let body = resp
                .into_body()
                .collect()
                .await
                .context("failed to read response body")?
                .to_bytes();
            serde_json::from_slice(&body).context("metrics response is not valid JSON")
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| anyhow::anyhow!("metrics query timed out"))?
    }
}
