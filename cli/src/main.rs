//! CLI for herowatch
//!
//! Operator commands that reuse the exporter's library:
//! - probe: look up subjects once and print what the adapter decodes
//! - snapshot: run one refresh cycle and print the resulting exposition

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "herowatch")]
#[command(about = "herowatch - Wikipedia superhero metrics", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch page info for one or more subjects
    Probe(commands::probe::ProbeArgs),

    /// Run one refresh cycle and print the metrics it produces
    Snapshot(commands::snapshot::SnapshotArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Probe(args) => commands::probe::run(args).await,
        Commands::Snapshot(args) => commands::snapshot::run(args).await,
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_snapshot_heroes_are_comma_separated() {
        let cli = Cli::parse_from(["herowatch", "snapshot", "--heroes", "Superman,Batman"]);
        match cli.command {
            Commands::Snapshot(args) => {
                assert_eq!(
                    args.heroes,
                    Some(vec!["Superman".to_string(), "Batman".to_string()])
                );
            }
            Commands::Probe(_) => panic!("expected snapshot"),
        }
    }

    #[test]
    fn test_probe_requires_a_title() {
        assert!(Cli::try_parse_from(["herowatch", "probe"]).is_err());
    }
}
