//! Cash flow data structures and series assembly

mod data;
mod assembler;

pub use data::{CashFlow, CashFlowSeries};
pub use assembler::assemble;
