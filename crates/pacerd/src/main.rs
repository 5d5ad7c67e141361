//! pacerd — the Pacer daemon.
//!
//! Single binary that assembles the adaptive frequency control loop:
//! - Throughput store (JSON file backed)
//! - Adjustment state gate + event router
//! - Agent load prober and frequency dispatcher (or dry-run stubs)
//! - HTTP event intake
//! - Optional latency watcher polling a metrics backend
//!
//! # Usage
//!
//! ```text
//! pacerd run --config pacer.toml --port 8620 --data-dir /var/lib/pacer
//! ```

mod assembly;
mod intake;
mod watcher;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pacer_core::PacerConfig;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pacerd", about = "Pacer daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the control loop and event intake.
    Run {
        /// Path to pacer.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port the event intake listens on. Overrides the config file.
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state. Overrides the config file.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pacerd=debug,pacer=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            port,
            data_dir,
        } => run(config, port, data_dir).await,
    }
}

async fn run(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    info!("Pacer daemon starting");

    let config = match &config_path {
        Some(path) => PacerConfig::from_file(path)?,
        None => PacerConfig::default(),
    };

    let daemon = config.daemon.clone().unwrap_or_default();
    let port = port.or(daemon.listen_port).unwrap_or(8620);
    let data_dir = data_dir
        .or_else(|| daemon.data_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/var/lib/pacer"));

    let router = assembly::build_router(&config, &data_dir)?;
    let app = intake::build_intake(router.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    spawn_latency_watcher(&config, router, shutdown_rx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "event intake listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!("Pacer daemon stopped");
    Ok(())
}

/// Start the latency watcher when the config carries a fully specified
/// `[metrics]` section; otherwise it stays off.
fn spawn_latency_watcher(
    config: &PacerConfig,
    router: std::sync::Arc<pacer_control::EventRouter>,
    shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let Some(metrics) = &config.metrics else {
        return;
    };
    let (Some(endpoint), Some(query), Some(threshold)) = (
        metrics.endpoint.clone(),
        metrics.latency_query.clone(),
        metrics.latency_threshold,
    ) else {
        warn!("incomplete [metrics] section, latency watcher disabled");
        return;
    };

    let interval = std::time::Duration::from_secs(metrics.interval_secs.unwrap_or(30));
    let watcher = watcher::LatencyWatcher::new(
        pacer_probe::MetricsClient::new(endpoint),
        query,
        threshold,
        router,
    );
    tokio::spawn(watcher.run(interval, shutdown));
}
