//! Snapshot command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use herowatch_exporter::config::ExporterConfig;
use herowatch_exporter::metrics::ExporterMetrics;
use herowatch_exporter::refresh::RefreshEngine;
use herowatch_exporter::source::WikipediaClient;
use herowatch_shared::Roster;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma-separated roster overriding the configured one
    #[arg(long, value_delimiter = ',')]
    pub heroes: Option<Vec<String>>,
}

pub async fn run(args: SnapshotArgs) -> Result<()> {
    let mut config = ExporterConfig::load(args.config.as_deref())?;
    if let Some(heroes) = args.heroes {
        config.heroes = Roster::new(heroes).context("Invalid --heroes")?;
    }
    debug!(
        api_base = %config.api_base,
        heroes = config.heroes.len(),
        "Running single refresh cycle"
    );

    let metrics = Arc::new(ExporterMetrics::new()?);
    let client = WikipediaClient::new(&config).context("Failed to build HTTP client")?;
    let engine = RefreshEngine::new(Arc::new(client), metrics.clone(), config.heroes.clone());

    let summary = engine.refresh().await?;
    print!("{}", metrics.encode()?);

    let line = format!(
        "{}/{} heroes fetched ({} missing, {} failed), {} categories, {} languages",
        summary.pages_found,
        summary.roster_size,
        summary.missing,
        summary.failed,
        summary.total_categories,
        summary.total_languages,
    );
    if summary.pages_found as usize == summary.roster_size {
        output::success(&line);
    } else {
        output::warning(&line);
    }
    Ok(())
}
