//! Wikipedia superhero exporter
//!
//! Runs one refresh synchronously, starts the background refresh loop and
//! serves the registry on /metrics until interrupted.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use herowatch_exporter::{
    config::ExporterConfig,
    metrics::ExporterMetrics,
    refresh::RefreshEngine,
    scheduler::{self, run_cycle, RefreshScheduler},
    server::http,
    source::WikipediaClient,
};
use herowatch_shared::utils::parse_duration;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "herowatch-exporter")]
#[command(about = "Prometheus exporter for superhero pages on Wikipedia", long_about = None)]
#[command(version)]
struct Args {
    /// Optional TOML configuration file
    #[arg(short, long, env = "HEROWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port (overrides EXPORTER_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Refresh interval, e.g. "20s", "1m" (overrides SCRAPE_INTERVAL)
    #[arg(short, long)]
    interval: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "LOG_FORMAT")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let mut config = ExporterConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.exporter_port = port;
    }
    if let Some(interval) = &args.interval {
        config.scrape_interval = parse_duration(interval)
            .context("Failed to parse refresh interval")?
            .as_secs();
    }
    config.validate()?;

    info!("Wikipedia API exporter starting");
    info!("Update interval: {} seconds", config.scrape_interval);
    info!("Metrics endpoint: http://localhost:{}/metrics", config.exporter_port);
    info!("Monitoring {} superheroes", config.heroes.len());

    let metrics = Arc::new(ExporterMetrics::new().context("Failed to create metrics registry")?);
    let source = Arc::new(WikipediaClient::new(&config).context("Failed to build HTTP client")?);
    let engine = Arc::new(RefreshEngine::new(
        source,
        metrics.clone(),
        config.heroes.clone(),
    ));

    info!("Fetching initial metrics");
    run_cycle(&engine).await;

    let refresher = RefreshScheduler::new(engine, config.refresh_interval());
    let stop = refresher.stop_token();
    let refresh_task = refresher.spawn();

    let listener = http::bind(config.listen_addr())
        .with_context(|| format!("Failed to bind {}", config.listen_addr()))?;

    http::serve(listener, metrics, shutdown_signal())
        .await
        .context("Metrics HTTP server error")?;

    info!("Shutting down");
    scheduler::shutdown(stop, refresh_task).await;
    info!("Exporter stopped");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
