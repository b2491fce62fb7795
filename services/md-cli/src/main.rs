//! md-cli
//!
//! Query dimension domains, histograms and features of a dataset.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use md_common::GridSetRegistry;
use md_engine::{DomainConfig, DomainEngine, HistogramStrategy};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use md_cli::{execute, Command, Dataset};

#[derive(Parser, Debug)]
#[command(name = "md-cli")]
#[command(about = "Query dimension domains, histograms and features of a layer", long_about = None)]
struct Cli {
    /// Path to the dataset YAML file
    #[arg(short = 'D', long, env = "MD_DATASET")]
    dataset: PathBuf,

    /// Log level
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Histogram strategy override: in_memory or delegated
    #[arg(long)]
    histogram_strategy: Option<String>,

    /// Pretty-print the output document
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // stdout carries the result document
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config = DomainConfig::from_env();
    if let Some(raw) = &cli.histogram_strategy {
        config.histogram_strategy = HistogramStrategy::from_str(raw)
            .ok_or_else(|| anyhow!("Unknown histogram strategy '{}'", raw))?;
    }
    config.validate().map_err(|e| anyhow!(e))?;

    let (resource, source) = Dataset::load(&cli.dataset)?.into_source()?;
    let grid_sets = GridSetRegistry::well_known();
    let engine = DomainEngine::new(&config, &resource, source.as_ref(), &grid_sets);

    info!(layer = %resource.name, command = ?cli.command, "Executing");
    let document = execute(&engine, &cli.command)?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{}", output);

    Ok(())
}
