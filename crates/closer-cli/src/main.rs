use anyhow::Result;
use clap::{Parser, Subcommand};
use closer_pipeline::CollectConfig;
use closer_storage::SeenSetStore;

#[derive(Debug, Parser)]
#[command(name = "closer-cli")]
#[command(about = "CloserJobs collection pipeline command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one collection cycle over the enabled registry sources.
    Run,
    /// Print the size of the persisted seen-fingerprint set.
    Seen,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = CollectConfig::from_env();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let summary = closer_pipeline::run_collection_once(&config).await?;
            println!(
                "collection complete: run_id={} sources={} collected={} new={} duplicates={} skipped={} reports={}",
                summary.run_id,
                summary.enabled_sources,
                summary.collected_listings,
                summary.new_records,
                summary.duplicate_records,
                summary.skipped_records,
                summary.reports_dir
            );
        }
        Commands::Seen => {
            let seen = SeenSetStore::new(&config.seen_path).load().await?;
            println!(
                "seen set: {} fingerprints at {}",
                seen.len(),
                config.seen_path.display()
            );
        }
    }

    Ok(())
}
