//! HTTP frequency dispatch to load-test agents.

use std::time::Duration;

use anyhow::Context;
use http_body_util::Full;
use hyper_util::rt::TokioIo;
use pacer_control::traits::{BoxFuture, Dispatcher};
use pacer_core::config::AgentConfig;
use tracing::{debug, info};

/// Pushes the adjusted operating frequency to every agent's control
/// endpoint (`POST http://<endpoint>/frequency`).
///
/// Any agent failure fails the whole dispatch; the cycle reports it and
/// moves on. No retry here.
pub struct HttpAgentDispatcher {
    agents: Vec<AgentConfig>,
    timeout: Duration,
}

impl HttpAgentDispatcher {
    pub fn new(agents: Vec<AgentConfig>) -> Self {
        Self {
            agents,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Dispatcher for HttpAgentDispatcher {
    fn dispatch(&self, frequency: u64) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            for agent in &self.agents {
                send_frequency(&agent.endpoint, frequency, self.timeout)
                    .await
                    .with_context(|| format!("dispatch to agent {} failed", agent.name))?;
                debug!(agent = %agent.name, frequency, "frequency accepted");
            }
            info!(frequency, agents = self.agents.len(), "frequency dispatched");
            Ok(())
        })
    }
}

async fn send_frequency(endpoint: &str, frequency: u64, timeout: Duration) -> anyhow::Result<()> {
    let uri = format!("http://{endpoint}/frequency");

    let request = async {
        let stream = tokio::net::TcpStream::connect(endpoint)
            .await
            .context("connect failed")?;
        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .context("handshake failed")?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let body = serde_json::json!({ "frequency": frequency }).to_string();
        let req = http::Request::builder()
            .method("POST")
            .uri(&uri)
            .header("host", endpoint)
            .header("content-type", "application/json")
            .body(Full::new(bytes::Bytes::from(body)))
            .context("failed to build request")?;

        let resp = sender.send_request(req).await.context("request failed")?;
        anyhow::ensure!(
            resp.status().is_success(),
            "agent returned {}",
            resp.status()
        );
        Ok(())
    };

    tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| anyhow::anyhow!("dispatch to {endpoint} timed out"))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::body::Incoming;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use std::sync::{Arc, Mutex};

    fn agent(endpoint: &str) -> AgentConfig {
        AgentConfig {
            name: "agent-test".to_string(),
            endpoint: endpoint.to_string(),
            labels: None,
        }
    }

    /// One-shot agent control endpoint recording the posted frequency.
    async fn spawn_agent_stub(seen: Arc<Mutex<Vec<u64>>>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let svc = service_fn(move |req: Request<Incoming>| {
                let seen = seen.clone();
                async move {
                    let body = req.into_body().collect().await.unwrap().to_bytes();
                    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
                    seen.lock().unwrap().push(parsed["frequency"].as_u64().unwrap());
                    Ok::<_, hyper::Error>(Response::new(Full::new(bytes::Bytes::from("ok"))))
                }
            });
            let _ = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, svc)
                .await;
        });

        addr.to_string()
    }

    #[tokio::test]
    async fn posts_frequency_to_agent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let endpoint = spawn_agent_stub(seen.clone()).await;

        let dispatcher = HttpAgentDispatcher::new(vec![agent(&endpoint)]);
        dispatcher.dispatch(120).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![120]);
    }

    #[tokio::test]
    async fn unreachable_agent_fails_the_dispatch() {
        // Reserved port with no listener.
        let dispatcher = HttpAgentDispatcher::new(vec![agent("127.0.0.1:1")])
            .with_timeout(Duration::from_millis(500));

        let err = dispatcher.dispatch(60).await.unwrap_err();
        assert!(err.to_string().contains("agent-test"));
    }
}
