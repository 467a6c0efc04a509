//! Gateway relay daemon
//!
//! Accepts readings from the configured intake sources, queues them, and
//! relays them to the upstream broker through a pool of reliable senders.
//!
//! # Usage
//!
//! ```bash
//! gatewayd --config configs/relay.toml
//! gatewayd --config configs/relay.toml --log-level debug
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use relay_config::{Config, LogFormat, SenderKind};
use relay_gateway::{
    AsyncQueue, BatchSenderWorker, GatewayError, GatewayMetrics, GatewayService, PoolConfig,
    SenderTransport, SendersPool, WorkerConfig,
};
use relay_protocol::Reading;
use relay_senders::{NullTransport, TcpTransport, TcpTransportConfig};
use relay_sources::{
    MockSource, MockSourceConfig, TcpLineSource, TcpLineSourceConfig,
};

/// Gateway relay daemon
#[derive(Parser, Debug)]
#[command(name = "gatewayd")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!(
                    "config file not found: {}",
                    path.display()
                ));
            }
            Config::from_file(path).context("failed to load configuration")?
        }
        None => {
            let default_path = PathBuf::from("configs/relay.toml");
            if default_path.exists() {
                Config::from_file(&default_path).context("failed to load configuration")?
            } else {
                Config::default()
            }
        }
    };
    config.validate().context("invalid configuration")?;

    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.log.level.as_str());
    init_logging(log_level, config.log.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        config = %cli
            .config
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(default)".to_string()),
        "gatewayd starting"
    );

    run_server(config).await?;

    info!("gatewayd shutdown complete");
    Ok(())
}

/// Main server run loop: wire up the pipeline, run until a signal arrives,
/// then drain and close in order (sources, worker, pool).
async fn run_server(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    let metrics = Arc::new(GatewayMetrics::default());
    let queue = Arc::new(AsyncQueue::new());

    let transport = build_transport(&config)?;

    let pool_config = PoolConfig::default()
        .with_size(config.gateway.pool_size)
        .with_subject(&config.gateway.subject)
        .with_identity(&config.gateway.device_id, &config.gateway.display_name)
        .with_log_threshold(config.gateway.log_threshold)
        .with_close_timeout(config.sender.close_timeout());
    let pool = Arc::new(SendersPool::new(
        transport,
        pool_config,
        Arc::clone(&metrics),
    ));

    let worker_config = WorkerConfig::default()
        .with_drain_poll_interval(config.gateway.drain_poll_interval())
        .with_start_timeout(config.gateway.start_timeout());
    let worker = Arc::new(BatchSenderWorker::new(
        Arc::clone(&queue),
        Arc::clone(&pool),
        worker_config,
        Arc::clone(&metrics),
    ));

    let service = {
        let worker = Arc::clone(&worker);
        Arc::new(
            GatewayService::new(Arc::clone(&queue), Arc::clone(&metrics))
                .with_on_data(move || worker.process())
                .with_transform(|raw| {
                    Reading::from_json(raw).map_err(|e| GatewayError::Transform(e.to_string()))
                }),
        )
    };

    worker.start().await.context("failed to start worker")?;

    let source_tasks = start_sources(&config, Arc::clone(&service), cancel.clone()).await?;

    info!(
        pool_size = pool.size(),
        source_count = source_tasks.len(),
        "gatewayd running"
    );

    wait_for_shutdown().await;
    info!("shutdown signal received, stopping...");

    // Stop intake first so the queue stops growing, then let the worker
    // finish its in-flight sends before the pool closes underneath it.
    cancel.cancel();
    for task in source_tasks {
        match tokio::time::timeout(Duration::from_secs(5), task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "source task panicked during shutdown"),
            Err(_) => warn!("source task did not finish within timeout"),
        }
    }

    let stopped = worker.stop(config.gateway.stop_timeout()).await;
    if !stopped {
        warn!("worker was not running at shutdown");
    }

    pool.close().await;

    let snapshot = metrics.snapshot();
    info!(
        enqueued = snapshot.enqueued,
        sent = snapshot.sent,
        send_failures = snapshot.send_failures,
        retries = snapshot.retries,
        requeued = snapshot.requeued,
        filtered = snapshot.filtered,
        queued_at_exit = service.queue_len(),
        "final counters"
    );

    Ok(())
}

/// Build the outbound transport selected by configuration
fn build_transport(config: &Config) -> Result<Arc<dyn SenderTransport>> {
    match config.sender.kind {
        SenderKind::Tcp => {
            // validate() guarantees a target for the tcp kind
            let target = config
                .sender
                .target
                .clone()
                .ok_or_else(|| anyhow::anyhow!("sender.target is required for type = \"tcp\""))?;
            let tcp_config = TcpTransportConfig::new(target)
                .with_connection_timeout(config.sender.connection_timeout())
                .with_write_timeout(config.sender.write_timeout())
                .with_keepalive(config.sender.keepalive)
                .with_keepalive_interval(config.sender.keepalive_interval());
            Ok(Arc::new(TcpTransport::new(tcp_config)))
        }
        SenderKind::Null => {
            info!("null sender configured, frames will be discarded");
            Ok(Arc::new(NullTransport::new()))
        }
    }
}

/// Start every enabled intake source
async fn start_sources(
    config: &Config,
    service: Arc<GatewayService>,
    cancel: CancellationToken,
) -> Result<Vec<JoinHandle<()>>> {
    let mut tasks = Vec::new();

    if config.sources.tcp.enabled {
        let source_config = TcpLineSourceConfig {
            address: config.sources.tcp.address.clone(),
            port: config.sources.tcp.port,
        };
        let source = TcpLineSource::bind(source_config, Arc::clone(&service), cancel.clone())
            .await
            .context("failed to bind tcp source")?;
        tasks.push(tokio::spawn(source.run()));
    }

    if config.sources.mock.enabled {
        let source_config = MockSourceConfig::default()
            .with_interval(config.sources.mock.interval())
            .with_device_count(config.sources.mock.device_count);
        let source = MockSource::new(source_config, Arc::clone(&service), cancel.clone());
        tasks.push(tokio::spawn(source.run()));
    }

    if tasks.is_empty() {
        warn!("no intake sources enabled, only pre-queued data will be relayed");
    }

    Ok(tasks)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}

/// Block until SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
