//! Prometheus exporter for NIC performance counters.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use netdev_exporter::config::LogFormat;
use netdev_exporter::{CollectorSettings, ExporterConfig, HttpServer, NetdevCollector, SystemRunner};

/// Prometheus exporter for NIC performance counters.
#[derive(Parser, Debug)]
#[command(name = "netdev-exporter")]
#[command(about = "Export ethtool and RDMA hardware counters as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// Web server port number (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Web server local address or host name (overrides config).
    #[arg(long)]
    bind: Option<String>,

    /// Log level: trace, debug, info, warning, error (overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Override from CLI
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(bind) = args.bind {
        config.http.bind = Some(bind);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    // Initialize logging
    let log_level = config.logging.tracing_level()?;
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("netdev_exporter={}", log_level).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Starting netdev exporter");

    let listen_addr = config.listen_addr().await?;
    let runner = SystemRunner::new(config.tools.timeout());
    let collector = Arc::new(NetdevCollector::new(
        CollectorSettings::from_config(&config),
        runner,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(collector, listen_addr, config.http.path.clone());
    let mut http_task = tokio::spawn(http_server.run(shutdown_rx));

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
        result = &mut http_task => {
            // The server only returns early if it failed to start.
            return result?;
        }
    }

    shutdown_tx.send(true)?;

    match tokio::time::timeout(Duration::from_secs(5), http_task).await {
        Ok(Ok(Err(e))) => error!("HTTP server error: {}", e),
        Ok(Err(e)) => error!("HTTP server task failed: {}", e),
        _ => {}
    }

    info!("Exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
