//! Prometheus exporter for nginx push stream channel statistics.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pushstream_common::{Catalog, Selection, init_tracing};
use tokio::sync::watch;
use tracing::{error, info, warn};

use pushstream_exporter::{ExporterConfig, Fetcher, HttpServer, MetricCollector};

/// Prometheus exporter for nginx push stream channel statistics.
#[derive(Parser, Debug)]
#[command(name = "pushstream-exporter")]
#[command(about = "Export nginx push stream channel statistics as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// Address to listen on for web interface and telemetry.
    #[arg(long = "web.listen-address")]
    listen_address: Option<String>,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path")]
    telemetry_path: Option<String>,

    /// URI on which to scrape nginx push stream channel stats.
    #[arg(long = "nginx.scrape-uri")]
    scrape_uri: Option<String>,

    /// Comma-separated list of exported metrics.
    #[arg(long = "nginx.metric-fields")]
    metric_fields: Option<String>,

    /// Timeout for trying to get stats from nginx (e.g. "5s", "500ms").
    #[arg(long = "nginx.timeout")]
    timeout: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration.
    fn apply(self, config: &mut ExporterConfig) {
        if let Some(listen_address) = self.listen_address {
            config.web.listen_address = listen_address;
        }
        if let Some(telemetry_path) = self.telemetry_path {
            config.web.telemetry_path = telemetry_path;
        }
        if let Some(scrape_uri) = self.scrape_uri {
            config.nginx.scrape_uri = scrape_uri;
        }
        if let Some(metric_fields) = self.metric_fields {
            config.nginx.metric_fields = Some(metric_fields);
        }
        if let Some(timeout) = self.timeout {
            config.nginx.timeout = timeout;
        }
        if let Some(log_level) = self.log_level {
            config.logging.level = log_level;
        }
    }
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
    args.apply(&mut config);
    config.validate()?;

    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting nginx push stream exporter"
    );

    let catalog = Catalog::standard();
    let selection = Selection::parse(&catalog, &config.nginx.metric_fields(&catalog));
    for key in selection.ignored() {
        warn!(key = %key, "Ignoring unknown metric field");
    }
    info!(
        metrics = ?selection.entries().iter().map(|e| e.key()).collect::<Vec<_>>(),
        "Selected metrics"
    );

    let fetcher = Fetcher::new(&config.nginx.scrape_uri, config.nginx.timeout()?)?;
    let collector = Arc::new(MetricCollector::new(
        fetcher,
        catalog,
        selection,
        config.nginx.namespace.clone(),
    ));

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(
        collector.clone(),
        config.web.socket_addr()?,
        config.web.telemetry_path.clone(),
    );

    // Start HTTP server
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for the server to drain
    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    // Print final stats
    let stats = collector.stats();
    info!(
        total_scrapes = stats.total_scrapes,
        failed_scrapes = stats.failed_scrapes,
        coercion_warnings = stats.coercion_warnings,
        "Final statistics"
    );

    info!("Exporter stopped");
    Ok(())
}
