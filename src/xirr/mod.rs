//! XIRR engine: day count, NPV evaluation and root finding

pub mod day_count;
mod npv;
mod solver;

pub use day_count::{years_between, DAYS_PER_YEAR};
pub use npv::{npv, npv_derivative, npv_and_derivative};
pub use solver::{compute_xirr, solve, SolveMethod, SolverConfig, XirrSolution};
