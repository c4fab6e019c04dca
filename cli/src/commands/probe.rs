//! Probe command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use herowatch_exporter::config::ExporterConfig;
use herowatch_exporter::source::{PageSource, WikipediaClient};
use herowatch_shared::{FetchOutcome, PageRecord};
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Subject names to look up
    #[arg(required = true)]
    pub titles: Vec<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print records as JSON lines
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ProbeArgs) -> Result<()> {
    let config = ExporterConfig::load(args.config.as_deref())?;
    let client = WikipediaClient::new(&config).context("Failed to build HTTP client")?;

    let mut failures = 0;
    for title in &args.titles {
        debug!(hero = %title, api_base = %config.api_base, "Probing subject");
        match client.fetch(title).await {
            FetchOutcome::Found(record) if args.json => {
                println!("{}", serde_json::to_string(&record)?);
            }
            FetchOutcome::Found(record) => print_record(title, &record),
            FetchOutcome::Missing => output::warning(&format!("{}: not found on Wikipedia", title)),
            FetchOutcome::Failed => {
                failures += 1;
                output::error(&format!("{}: request failed (see log for details)", title));
            }
        }
    }

    if failures == args.titles.len() {
        anyhow::bail!("All {} lookups failed", failures);
    }
    Ok(())
}

fn print_record(subject: &str, record: &PageRecord) {
    println!("{} ({})", subject.bold(), record.title);
    println!("  length:       {}", record.length);
    println!("  revisions:    {}", record.revisions);
    println!("  categories:   {}", record.category_count());
    println!("  languages:    {}", record.language_count());
    println!("  namespace:    {}", record.namespace);
    println!("  redirect:     {}", yes_no(record.redirect));
    println!("  disambig:     {}", yes_no(record.disambiguation));
    if let Some(touched) = record.touched {
        println!("  touched:      {}", touched.to_rfc3339());
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
