//! Portfolio XIRR CLI
//!
//! Loads a transaction statement (JSON, or CSV by extension), values the
//! holdings at current NAV and prints the portfolio value, gain and XIRR.
//! Solver settings come from defaults, then `XIRR_*` environment variables,
//! then command-line flags.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use portfolio_xirr::portfolio::{load_transactions_file, NavTable};
use portfolio_xirr::{analyze_portfolio, SolverConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "portfolio-xirr",
    version,
    about = "Portfolio value, gain and XIRR from a transaction statement"
)]
struct Args {
    /// Transaction statement (.json statement or .csv)
    #[arg(default_value = "transaction_detail.json")]
    transactions: PathBuf,

    /// NAV table CSV (isin,nav); defaults to the built-in sample NAVs
    #[arg(long)]
    navs: Option<PathBuf>,

    /// Valuation date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Newton-Raphson starting rate
    #[arg(long)]
    initial_guess: Option<f64>,

    /// Newton-Raphson iteration cap
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Convergence tolerance on normalized NPV
    #[arg(long)]
    tolerance: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn solver_config(&self) -> SolverConfig {
        let mut config = SolverConfig::default().with_env_overrides();
        if let Some(guess) = self.initial_guess {
            config.initial_guess = guess;
        }
        if let Some(max_iter) = self.max_iterations {
            config.max_newton_iterations = max_iter;
        }
        if let Some(tolerance) = self.tolerance {
            config.value_tolerance = tolerance;
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = args.solver_config();
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    let transactions = load_transactions_file(&args.transactions)
        .with_context(|| format!("loading transactions from {}", args.transactions.display()))?;

    let navs = match &args.navs {
        Some(path) => NavTable::from_csv(path)
            .with_context(|| format!("loading NAVs from {}", path.display()))?,
        None => NavTable::sample(),
    };

    let report = analyze_portfolio(&transactions, &navs, as_of, &config)
        .context("valuing portfolio")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(())
}
