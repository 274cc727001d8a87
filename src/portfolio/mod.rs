//! Portfolio collaborators: transaction loading, NAV lookup and valuation

mod transaction;
mod nav;
mod valuation;
pub mod loader;

pub use transaction::{cash_flows, parse_statement_date, Transaction, STATEMENT_DATE_FORMAT};
pub use nav::{NavProvider, NavTable};
pub use valuation::{holdings, portfolio_gain, portfolio_value, units_by_isin, Holding};
pub use loader::{
    load_transactions, load_transactions_csv, load_transactions_csv_from_reader,
    load_transactions_file, load_transactions_from_reader,
};
