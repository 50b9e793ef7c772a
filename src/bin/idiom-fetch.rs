use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use idiom_core::model::config::DefinitionPolicy;
use idiom_core::services::fetcher;
use idiom_core::{logging, AppConfig, Category};

#[derive(Parser)]
#[command(name = "idiom-fetch")]
#[command(about = "Fetch idiom definitions from Wiktionary into the intermediate dataset")]
struct Cli {
    /// JSON config file (defaults to ./idioms.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Intermediate dataset to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Restrict to these categories (aphorism, simile, proverb)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<Category>,

    /// Keep every numbered definition instead of the first one
    #[arg(long)]
    all_definitions: bool,

    /// Append to an existing output, skipping titles it already holds
    #[arg(long)]
    resume: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut cfg = AppConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?
        .fetch;

    if let Some(out) = cli.output {
        cfg.output = out;
    }
    if !cli.categories.is_empty() {
        cfg.categories = cli.categories;
    }
    if cli.all_definitions {
        cfg.definition_policy = DefinitionPolicy::All;
    }
    cfg.resume |= cli.resume;

    let report = fetcher::run(&cfg)
        .with_context(|| format!("fetch into {} failed", cfg.output.display()))?;

    tracing::debug!(report = %serde_json::to_string(&report)?, "fetch report");
    println!(
        "fetched {} entries ({} skipped, {} already present) from {} listed titles -> {}",
        report.fetched,
        report.skipped(),
        report.skipped_existing,
        report.titles_listed,
        cfg.output.display()
    );

    Ok(())
}
