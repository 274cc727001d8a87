//! Portfolio report: valuation, gain and XIRR for one set of transactions
//!
//! Wires the collaborators to the core: transactions become outflows, the
//! current portfolio value becomes a terminal inflow dated `as_of`, and the
//! assembled series goes to the solver.

use crate::cashflow::{assemble, CashFlow, CashFlowSeries};
use crate::error::{PortfolioError, XirrError};
use crate::portfolio::{
    cash_flows, holdings, portfolio_gain, portfolio_value, Holding, NavProvider, Transaction,
};
use crate::xirr::{solve, SolverConfig, XirrSolution};
use chrono::NaiveDate;
use log::warn;
use serde::Serialize;
use std::fmt::Write;

/// Full analysis of one portfolio
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub as_of: NaiveDate,
    pub transaction_count: usize,
    /// Net money paid in (purchases minus redemptions)
    pub net_invested: f64,
    pub portfolio_value: f64,
    pub portfolio_gain: f64,
    pub holdings: Vec<Holding>,
    /// Present when the solver converged
    pub xirr: Option<XirrSolution>,
    /// Present when the solver (or series assembly) failed
    pub xirr_error: Option<String>,
}

impl PortfolioReport {
    /// XIRR as a percentage, when available
    pub fn xirr_pct(&self) -> Option<f64> {
        self.xirr.map(|s| s.rate * 100.0)
    }

    /// Human-readable summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Portfolio as of {}", self.as_of);
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(out, "{:<16} {:>12} {:>12} {:>16}", "ISIN", "Units", "NAV", "Value");
        for h in &self.holdings {
            let _ = writeln!(
                out,
                "{:<16} {:>12.4} {:>12.4} {:>16.2}",
                h.isin, h.units, h.nav, h.value
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(out, "Transactions:          {}", self.transaction_count);
        let _ = writeln!(out, "Net Invested:          {:.2}", self.net_invested);
        let _ = writeln!(out, "Total Portfolio Value: {:.2}", self.portfolio_value);
        let _ = writeln!(out, "Total Portfolio Gain:  {:.2}", self.portfolio_gain);
        match (&self.xirr, &self.xirr_error) {
            (Some(solution), _) => {
                let _ = writeln!(
                    out,
                    "XIRR: {:.2}% ({:?}, {} newton / {} bisection iterations)",
                    solution.rate * 100.0,
                    solution.method,
                    solution.newton_iterations,
                    solution.bisection_iterations
                );
            }
            (None, Some(err)) => {
                let _ = writeln!(out, "XIRR calculation failed: {}", err);
            }
            (None, None) => {}
        }
        out
    }
}

/// Transactions as outflows plus the current value as a terminal inflow
pub fn portfolio_series<N: NavProvider + ?Sized>(
    transactions: &[Transaction],
    navs: &N,
    as_of: NaiveDate,
) -> Result<CashFlowSeries, PortfolioError> {
    let value = portfolio_value(transactions, navs)?;
    Ok(valued_series(transactions, value, as_of)?)
}

fn valued_series(
    transactions: &[Transaction],
    portfolio_value: f64,
    as_of: NaiveDate,
) -> Result<CashFlowSeries, XirrError> {
    let terminal = CashFlow::new(as_of, portfolio_value);
    assemble(&cash_flows(transactions), Some(terminal))
}

/// XIRR of a portfolio valued at `as_of`, with every failure propagated
pub fn portfolio_xirr<N: NavProvider + ?Sized>(
    transactions: &[Transaction],
    navs: &N,
    as_of: NaiveDate,
    config: &SolverConfig,
) -> Result<XirrSolution, PortfolioError> {
    let series = portfolio_series(transactions, navs, as_of)?;
    Ok(solve(&series, config)?)
}

/// Value the portfolio and compute its XIRR
///
/// Valuation failures (unknown instruments) abort the report. XIRR failures
/// do not: they are recorded in `xirr_error` and `xirr` is left empty.
pub fn analyze_portfolio<N: NavProvider + ?Sized>(
    transactions: &[Transaction],
    navs: &N,
    as_of: NaiveDate,
    config: &SolverConfig,
) -> Result<PortfolioReport, PortfolioError> {
    let holdings = holdings(transactions, navs)?;
    let portfolio_value = holdings.iter().map(|h| h.value).sum();
    let portfolio_gain = portfolio_gain(transactions, navs)?;

    let solved =
        valued_series(transactions, portfolio_value, as_of).and_then(|s| solve(&s, config));

    let (xirr, xirr_error) = match solved {
        Ok(solution) => (Some(solution), None),
        Err(err) => {
            warn!("XIRR unavailable: {}", err);
            (None, Some(err.to_string()))
        }
    };

    Ok(PortfolioReport {
        as_of,
        transaction_count: transactions.len(),
        net_invested: transactions.iter().map(|t| t.amount).sum(),
        portfolio_value,
        portfolio_gain,
        holdings,
        xirr,
        xirr_error,
    })
}
