use anyhow::{Context, Result};
use clap::Parser;
use irkit_indexer::IndexBuilder;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "build-index")]
#[command(about = "Build a full-text index from a YAML build configuration", long_about = None)]
struct Cli {
    /// Build configuration (YAML)
    #[arg(long)]
    config: PathBuf,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let builder = IndexBuilder::from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let stats = builder.build().context("index build failed")?;
    println!(
        "indexed {} documents ({} terms, {} unique) into {}",
        stats.documents,
        stats.terms,
        stats.unique_terms,
        builder.config().index_path.display()
    );
    Ok(())
}
