use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use taxmap::config::{PolicyConfig, RevenueMode};
use taxmap::output::{
    constituency_impact_rows, household_impact_rows, surcharge_impact_rows,
    surcharge_summary_rows, write_table,
};
use taxmap::pipeline::{run, RunOutput};
use taxmap::refdata::{load_directory, load_households, load_postcode_index};
use taxmap::sales::load_sales;

#[derive(Debug, Parser)]
#[command(
    name = "taxmap",
    about = "Constituency-level impact analysis of UK property tax proposals"
)]
struct Cli {
    /// Directory the output tables are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Flat-fee mansion tax: sales at or above each threshold, with
    /// household-impact percentages.
    Threshold {
        /// Headerless Land Registry price-paid CSV.
        #[arg(long)]
        sales: PathBuf,
        /// Postcode -> constituency code CSV shard(s).
        #[arg(long, required = true, num_args = 1..)]
        postcodes: Vec<PathBuf>,
        /// Constituency code -> name CSV.
        #[arg(long)]
        constituencies: PathBuf,
        /// Census household counts CSV.
        #[arg(long)]
        households: PathBuf,
        /// Price threshold(s) in pounds.
        #[arg(long, num_args = 1.., default_values_t = [1_500_000u64, 2_000_000u64])]
        threshold: Vec<u64>,
    },
    /// Autumn Budget 2025 high value council tax surcharge: 2024 sales
    /// uprated to 2026 prices, banded charges, OBR revenue allocation.
    Surcharge {
        #[arg(long)]
        sales: PathBuf,
        #[arg(long, required = true, num_args = 1..)]
        postcodes: Vec<PathBuf>,
        #[arg(long)]
        constituencies: PathBuf,
    },
}

fn threshold_label(threshold: u64) -> String {
    let millions = threshold as f64 / 1_000_000.0;
    if millions.fract() == 0.0 {
        format!("{}m", millions as u64)
    } else {
        format!("{millions}m")
    }
}

fn log_summary(output: &RunOutput) {
    let s = &output.summary;
    info!(
        total = s.total_records,
        in_scope = s.in_scope,
        in_scope_pct = s.in_scope_share.map(|x| x * 100.0),
        matched = s.matched,
        unmatched = s.unmatched,
        match_rate_pct = s.match_rate.map(|x| x * 100.0),
        "run summary"
    );
    if let Some(breakdown) = &output.band_breakdown {
        for band in breakdown {
            let label = match band.upper {
                Some(upper) => format!(
                    "£{:.1}m-£{:.1}m",
                    band.lower as f64 / 1e6,
                    upper as f64 / 1e6
                ),
                None => format!("£{:.1}m+", band.lower as f64 / 1e6),
            };
            info!(band = %label, charge = band.charge, count = band.count, "band breakdown");
        }
    }
    for stat in output.stats.iter().take(10) {
        info!(
            constituency = %stat.constituency_name,
            sales = stat.sales_count,
            revenue = stat.derived_revenue,
            "top constituency"
        );
    }
}

fn run_threshold(
    out_dir: &PathBuf,
    sales: &PathBuf,
    postcodes: &[PathBuf],
    constituencies: &PathBuf,
    households: &PathBuf,
    thresholds: &[u64],
) -> Result<()> {
    let index = load_postcode_index(postcodes)?;
    let directory = load_directory(constituencies)?;
    let households = load_households(households)?;
    info!(
        postcodes = index.len(),
        constituencies = directory.len(),
        "loaded reference data"
    );

    for &threshold in thresholds {
        let label = threshold_label(threshold);
        info!(threshold, %label, "analysing threshold");

        // Sales are re-read per threshold; the pipeline consumes its input.
        let records = load_sales(sales)?;
        let config = PolicyConfig::mansion_tax_2024(threshold);
        let output = run(records, &index, &directory, Some(&households), &config)?;
        log_summary(&output);

        let fee = match config.revenue {
            RevenueMode::FlatFee(fee) => fee,
            RevenueMode::Banded => unreachable!("threshold preset is flat-fee"),
        };
        let impact = constituency_impact_rows(&output.stats);
        let household_impact = household_impact_rows(&output.stats, fee);
        write_table(
            out_dir.join(format!("constituency_impact_{label}.csv")),
            &impact,
        )?;
        write_table(
            out_dir.join(format!("household_impact_{label}.csv")),
            &household_impact,
        )?;
        info!(constituencies = impact.len(), %label, "wrote impact tables");
    }
    Ok(())
}

fn run_surcharge(
    out_dir: &PathBuf,
    sales: &PathBuf,
    postcodes: &[PathBuf],
    constituencies: &PathBuf,
) -> Result<()> {
    let index = load_postcode_index(postcodes)?;
    let directory = load_directory(constituencies)?;
    info!(
        postcodes = index.len(),
        constituencies = directory.len(),
        "loaded reference data"
    );

    let records = load_sales(sales)?;
    let config = PolicyConfig::autumn_budget_2025()?;
    let output = run(records, &index, &directory, None, &config)?;
    log_summary(&output);

    let impact = surcharge_impact_rows(&output.stats);
    let summary = surcharge_summary_rows(&output.stats);
    write_table(out_dir.join("constituency_surcharge_impact.csv"), &impact)?;
    write_table(out_dir.join("constituency_surcharge_summary.csv"), &summary)?;
    info!(constituencies = impact.len(), "wrote surcharge tables");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating output directory {}", cli.out_dir.display()))?;

    match &cli.command {
        Commands::Threshold {
            sales,
            postcodes,
            constituencies,
            households,
            threshold,
        } => run_threshold(
            &cli.out_dir,
            sales,
            postcodes,
            constituencies,
            households,
            threshold,
        ),
        Commands::Surcharge {
            sales,
            postcodes,
            constituencies,
        } => run_surcharge(&cli.out_dir, sales, postcodes, constituencies),
    }
}
