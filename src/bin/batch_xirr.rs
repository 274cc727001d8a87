//! Compute XIRR for many transaction files in parallel
//!
//! Writes one CSV row per input file. Files that fail to load or value are
//! still listed, with the error in the last column.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use portfolio_xirr::portfolio::{load_transactions_file, NavTable, Transaction};
use portfolio_xirr::{PortfolioError, PortfolioRunner, SolverConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "batch_xirr", about = "XIRR for many portfolios, summarized to CSV")]
struct Args {
    /// Transaction files (.json statements or .csv)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// NAV table CSV (isin,nav); defaults to the built-in sample NAVs
    #[arg(long)]
    navs: Option<PathBuf>,

    /// Valuation date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Output CSV path
    #[arg(long, default_value = "xirr_summary.csv")]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    file: String,
    transactions: usize,
    portfolio_value: Option<f64>,
    portfolio_gain: Option<f64>,
    xirr_pct: Option<f64>,
    method: Option<String>,
    error: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start = Instant::now();
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    let navs = match &args.navs {
        Some(path) => NavTable::from_csv(path)
            .with_context(|| format!("loading NAVs from {}", path.display()))?,
        None => NavTable::sample(),
    };
    let runner = PortfolioRunner::new(navs, as_of)
        .with_config(SolverConfig::default().with_env_overrides());

    println!("Loading {} transaction files...", args.files.len());
    let loaded: Vec<Result<Vec<Transaction>, PortfolioError>> =
        args.files.iter().map(load_transactions_file).collect();

    // Reports come back in input order, one per loaded file
    let portfolios: Vec<Vec<Transaction>> = loaded
        .iter()
        .filter_map(|r| r.as_ref().ok().cloned())
        .collect();

    println!("Computing XIRR as of {}...", as_of);
    let calc_start = Instant::now();
    let mut reports = runner.run_batch(&portfolios).into_iter();
    println!("Computed {} portfolios in {:?}", portfolios.len(), calc_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut converged = 0;

    for (path, load_result) in args.files.iter().zip(&loaded) {
        let file = path.display().to_string();
        let row = match load_result {
            Err(err) => SummaryRow {
                file,
                transactions: 0,
                portfolio_value: None,
                portfolio_gain: None,
                xirr_pct: None,
                method: None,
                error: Some(err.to_string()),
            },
            Ok(transactions) => match reports
                .next()
                .context("batch returned fewer reports than inputs")?
            {
                Err(err) => SummaryRow {
                    file,
                    transactions: transactions.len(),
                    portfolio_value: None,
                    portfolio_gain: None,
                    xirr_pct: None,
                    method: None,
                    error: Some(err.to_string()),
                },
                Ok(report) => {
                    if report.xirr.is_some() {
                        converged += 1;
                    }
                    SummaryRow {
                        file,
                        transactions: report.transaction_count,
                        portfolio_value: Some(report.portfolio_value),
                        portfolio_gain: Some(report.portfolio_gain),
                        xirr_pct: report.xirr_pct(),
                        method: report.xirr.map(|s| format!("{:?}", s.method)),
                        error: report.xirr_error,
                    }
                }
            },
        };
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("Output written to {}", args.output.display());
    println!("\nBatch Summary:");
    println!("  Files:      {}", args.files.len());
    println!("  Loaded:     {}", portfolios.len());
    println!("  Converged:  {}", converged);
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
