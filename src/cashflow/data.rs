//! Dated cash flow structures consumed by the XIRR solver

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated, signed amount
///
/// Negative = money invested (outflow), positive = money received (inflow).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }

    pub fn is_outflow(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_inflow(&self) -> bool {
        self.amount > 0.0
    }
}

/// Validated, date-ordered cash flows ready for root finding
///
/// Only [`assemble`](crate::cashflow::assemble) builds one, so every series
/// holds these invariants:
/// - non-empty, sorted by date ascending
/// - no zero, NaN or infinite amounts
/// - at least one outflow and one inflow
/// - `anchor` is the earliest date, so every elapsed time is non-negative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowSeries {
    flows: Vec<CashFlow>,
    anchor: NaiveDate,
}

impl CashFlowSeries {
    pub(crate) fn from_validated(flows: Vec<CashFlow>) -> Self {
        let anchor = flows[0].date;
        Self { flows, anchor }
    }

    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    /// Earliest date in the series; all year fractions are measured from here
    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Always false for an assembled series
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.flows[self.flows.len() - 1].date
    }

    /// Largest absolute amount, used to normalize NPV tolerances
    pub fn scale(&self) -> f64 {
        self.flows
            .iter()
            .map(|cf| cf.amount.abs())
            .fold(0.0, f64::max)
    }
}
