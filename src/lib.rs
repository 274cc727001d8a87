//! Portfolio XIRR - annualized return for irregular mutual fund cash flows
//!
//! This library provides:
//! - Actual/365 Fixed year fractions and NPV over dated cash flows
//! - Newton-Raphson XIRR with a bisection fallback and explicit failure modes
//! - Cash flow validation and assembly (zero filtering, anchor, terminal value)
//! - Statement loading, NAV lookup and portfolio valuation
//! - Parallel batch analysis of many portfolios

pub mod error;
pub mod cashflow;
pub mod xirr;
pub mod portfolio;
pub mod report;
pub mod batch;

// Re-export commonly used types
pub use error::{PortfolioError, XirrError};
pub use cashflow::{assemble, CashFlow, CashFlowSeries};
pub use xirr::{compute_xirr, solve, SolveMethod, SolverConfig, XirrSolution};
pub use portfolio::{NavProvider, NavTable, Transaction};
pub use report::{analyze_portfolio, portfolio_xirr, PortfolioReport};
pub use batch::PortfolioRunner;
