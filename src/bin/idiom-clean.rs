use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use idiom_core::model::config::ReferencePolicy;
use idiom_core::services::cleaner;
use idiom_core::{logging, AppConfig};

#[derive(Parser)]
#[command(name = "idiom-clean")]
#[command(about = "Deduplicate the intermediate idiom dataset into the final one")]
struct Cli {
    /// JSON config file (defaults to ./idioms.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Intermediate dataset to read
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Final dataset to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace "see X" definitions with X's definition instead of dropping them
    #[arg(long)]
    resolve_references: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut cfg = AppConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?
        .clean;

    if let Some(input) = cli.input {
        cfg.input = input;
    }
    if let Some(output) = cli.output {
        cfg.output = output;
    }
    if cli.resolve_references {
        cfg.reference_policy = ReferencePolicy::Resolve;
    }

    let report = cleaner::run(&cfg)
        .with_context(|| format!("cleaning {} failed", cfg.input.display()))?;

    tracing::debug!(report = %serde_json::to_string(&report)?, "clean report");
    println!(
        "{} rows read, {} malformed, {} duplicates, {} references, {} synonyms removed; {} written -> {}",
        report.total_rows,
        report.malformed,
        report.exact_duplicates,
        report.references_dropped + report.dangling_references,
        report.synonyms,
        report.written,
        cfg.output.display()
    );

    Ok(())
}
