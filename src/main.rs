//! pubmed-company-finder - PubMed papers with pharma/biotech authors
//!
//! ```bash
//! pubmed-company-finder "cancer immunotherapy" --max-results 50 --file results.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use pubmed_company_finder::finder::{self, DEFAULT_MAX_RESULTS};
use pubmed_company_finder::pubmed::{PubMedClient, PubMedConfig, DEFAULT_EMAIL, DEFAULT_TOOL};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Fetch research papers from PubMed and identify those with authors from
/// pharmaceutical/biotech companies
#[derive(Debug, Parser)]
#[command(name = "pubmed-company-finder")]
#[command(version, about, long_about = None)]
struct Cli {
    /// PubMed search query (supports full PubMed syntax)
    query: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to save the results as CSV; printed to stdout if omitted
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Maximum number of results to fetch
    #[arg(short, long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Contact email sent to NCBI
    #[arg(long, default_value = DEFAULT_EMAIL)]
    email: String,

    /// Tool name sent to NCBI
    #[arg(long, default_value = DEFAULT_TOOL)]
    tool: String,

    /// NCBI API key
    #[arg(long)]
    api_key: Option<String>,
}

impl Cli {
    fn pubmed_config(&self) -> PubMedConfig {
        PubMedConfig {
            email: self.email.clone(),
            tool: self.tool.clone(),
            api_key: self.api_key.clone(),
            ..Default::default()
        }
    }
}

fn init_logging(debug: bool) {
    let log_level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    // stdout is reserved for CSV output
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    info!(query = %cli.query, "Searching for papers");

    exit_code(run(&cli).await)
}

/// Log a failed run once and map it to a non-zero exit status.
fn exit_code(outcome: Result<()>) -> ExitCode {
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("An error occurred: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let client = PubMedClient::new(cli.pubmed_config()).context("Failed to create PubMed client")?;

    let csv_output = finder::find_and_export_papers(&client, &cli.query, cli.file.as_deref(), cli.max_results)
        .await
        .context("Paper retrieval failed")?;

    if let Some(csv_text) = csv_output.filter(|s| !s.is_empty()) {
        print!("{}", csv_text);
    }
    Ok(())
}
