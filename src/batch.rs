//! Batch runner for computing many portfolios at once
//!
//! Holds the NAV table and solver settings once, then evaluates any number of
//! portfolios. Every computation is independent, so batches fan out across
//! threads with rayon.

use crate::cashflow::CashFlowSeries;
use crate::error::{PortfolioError, XirrError};
use crate::portfolio::{NavTable, Transaction};
use crate::report::{analyze_portfolio, PortfolioReport};
use crate::xirr::{solve, SolverConfig, XirrSolution};
use chrono::NaiveDate;
use log::info;
use rayon::prelude::*;

/// Pre-loaded runner for batch portfolio analysis
///
/// # Example
/// ```ignore
/// let runner = PortfolioRunner::new(NavTable::from_csv("navs.csv")?, as_of);
/// let reports = runner.run_batch(&portfolios);
/// ```
#[derive(Debug, Clone)]
pub struct PortfolioRunner {
    navs: NavTable,
    config: SolverConfig,
    as_of: NaiveDate,
}

impl PortfolioRunner {
    /// Runner with default solver settings
    pub fn new(navs: NavTable, as_of: NaiveDate) -> Self {
        Self {
            navs,
            config: SolverConfig::default(),
            as_of,
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Analyze a single portfolio
    pub fn run(&self, transactions: &[Transaction]) -> Result<PortfolioReport, PortfolioError> {
        analyze_portfolio(transactions, &self.navs, self.as_of, &self.config)
    }

    /// Analyze many portfolios in parallel; results keep input order
    pub fn run_batch(
        &self,
        portfolios: &[Vec<Transaction>],
    ) -> Vec<Result<PortfolioReport, PortfolioError>> {
        let results: Vec<_> = portfolios
            .par_iter()
            .map(|transactions| self.run(transactions))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!("analyzed {} portfolios ({} failed)", results.len(), failed);
        results
    }

    /// Solve already-assembled series in parallel
    pub fn solve_batch(&self, series: &[CashFlowSeries]) -> Vec<Result<XirrSolution, XirrError>> {
        series
            .par_iter()
            .map(|s| solve(s, &self.config))
            .collect()
    }
}
