//! Loyalty Platform Analytics Report
//!
//! Fetches members, agents and tier prices from the admin API, aggregates the
//! current calendar month and writes a multi-sheet report.

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loyalty_analytics::config::FileConfig;
use loyalty_analytics::export::{ExportFormat, SaveToDirectory};
use loyalty_analytics::fetch::HttpSource;
use loyalty_analytics::types::{AuthToken, TimeSeriesInputs};
use loyalty_analytics::{ReportOptions, generate_report};

#[derive(Parser, Debug)]
#[command(name = "loyalty-analytics")]
#[command(about = "Monthly analytics workbook for the loyalty platform")]
struct Args {
    /// Path to config.toml
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Admin API bearer token
    #[arg(long, env = "ANALYTICS_API_TOKEN", hide_env_values = true)]
    token: String,

    /// JSON file with daily user growth points
    #[arg(long)]
    user_growth: Option<PathBuf>,

    /// JSON file with daily revenue points
    #[arg(long)]
    revenue: Option<PathBuf>,

    /// Output directory (overrides report.output_dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format (overrides report.format)
    #[arg(long, value_enum)]
    format: Option<ExportFormat>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Load config file or exit with helpful message
fn load_config_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        anyhow::bail!(
            "Config file '{}' not found.\n\n\
            To get started:\n\
            1. Copy config.toml.example to config.toml\n\
            2. Set api.base_url\n\n\
            See config.toml.example for the required format.",
            path.display()
        );
    }

    FileConfig::load(path)
}

/// Read a JSON array of points; a missing path means an empty series.
fn load_series<T: DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read series file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse series file: {}", path.display()))
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "loyalty_analytics=debug"
    } else {
        "loyalty_analytics=info"
    };
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file_config = load_config_file(&args.config)?;
    let series = TimeSeriesInputs {
        user_growth: load_series(args.user_growth.as_deref())?,
        revenue: load_series(args.revenue.as_deref())?,
    };

    let output_dir = args.output_dir.unwrap_or_else(|| file_config.report.output_dir.clone());
    let options = ReportOptions {
        file_prefix: file_config.report.file_prefix.clone(),
        format: args.format.unwrap_or(file_config.report.format),
    };

    info!(api = %file_config.api.base_url, output = %output_dir.display(), "Starting report run");

    let source = HttpSource::new(file_config.api).context("Failed to build HTTP client")?;
    let token = AuthToken::new(args.token);
    let delivery = SaveToDirectory::new(output_dir);

    match generate_report(&source, &token, &series, &options, &delivery).await {
        Ok(outcome) => {
            if !outcome.issues.is_empty() {
                warn!(count = outcome.issues.len(), "Some cells were written as N/A");
            }
            println!("Report written to {}", outcome.path.display());
            println!("Sheets: {}", outcome.sheet_names.join(", "));
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Report generation failed");
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
