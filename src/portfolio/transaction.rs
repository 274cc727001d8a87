//! Investment transaction records

use crate::cashflow::CashFlow;
use crate::error::PortfolioError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by fund statements, e.g. `05-Jan-2021`
pub const STATEMENT_DATE_FORMAT: &str = "%d-%b-%Y";

/// A single purchase or redemption of fund units
///
/// Field names double as the CSV header (`date,amount,units,isin,purchase_price`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Trade date
    pub date: NaiveDate,

    /// Money paid into the fund (negative for redemptions)
    pub amount: f64,

    /// Units allotted (negative for redemptions)
    pub units: f64,

    /// Instrument identifier
    pub isin: String,

    /// Per-unit price paid
    pub purchase_price: f64,
}

impl Transaction {
    /// Investor's view of the transaction: purchases are outflows
    pub fn cash_flow(&self) -> CashFlow {
        CashFlow::new(self.date, -self.amount)
    }

    /// Units × purchase price
    pub fn acquisition_cost(&self) -> f64 {
        self.units * self.purchase_price
    }
}

/// Convert transactions into investor cash flows, preserving order
pub fn cash_flows(transactions: &[Transaction]) -> Vec<CashFlow> {
    transactions.iter().map(Transaction::cash_flow).collect()
}

/// Parse a statement date such as `05-Jan-2021`
pub fn parse_statement_date(value: &str) -> Result<NaiveDate, PortfolioError> {
    NaiveDate::parse_from_str(value.trim(), STATEMENT_DATE_FORMAT).map_err(|_| {
        PortfolioError::InvalidDate {
            value: value.to_string(),
        }
    })
}
