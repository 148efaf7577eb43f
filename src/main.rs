//! listing-report CLI - sales report for a product listing export

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use listing_report::{DEFAULT_DATA_PATH, LoadOptions, ProductTable, ReportConfig, SalesReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser)]
#[command(name = "listing-report")]
#[command(about = "Print a sales report for an e-commerce product listing CSV")]
struct Cli {
    /// CSV with brand, title, type, price, sold and available columns
    #[arg(value_name = "PATH", default_value = DEFAULT_DATA_PATH)]
    path: PathBuf,

    /// Report heading
    #[arg(long)]
    title: Option<String>,

    #[arg(long, default_value_t = 10)]
    top_brands: usize,

    #[arg(long, default_value_t = 10)]
    top_categories: usize,

    #[arg(long, default_value_t = 10)]
    best_sellers: usize,

    /// Rows in each of the most and least efficient tables
    #[arg(long, default_value_t = 5)]
    efficiency_rows: usize,

    /// Drop malformed records instead of failing
    #[arg(long)]
    skip_malformed: bool,
}

impl Cli {
    fn report_config(&self) -> ReportConfig {
        let defaults = ReportConfig::default();
        ReportConfig {
            title: self.title.clone().unwrap_or(defaults.title),
            top_brands: self.top_brands,
            top_categories: self.top_categories,
            best_sellers: self.best_sellers,
            efficiency_rows: self.efficiency_rows,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = LoadOptions {
        skip_malformed_rows: cli.skip_malformed,
    };

    info!("Loading listings from {}", cli.path.display());
    let table = ProductTable::load_csv(&cli.path, &options)
        .with_context(|| format!("failed to load {}", cli.path.display()))?;

    let report = SalesReport::generate(&table, &cli.report_config())
        .with_context(|| format!("failed to analyze {}", cli.path.display()))?;

    print!("{report}");
    Ok(())
}
