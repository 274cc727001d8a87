//! Portfolio valuation: units held per instrument, market value and gain

use super::nav::NavProvider;
use super::transaction::Transaction;
use crate::error::PortfolioError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net units held in one instrument, valued at current NAV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub isin: String,
    pub units: f64,
    pub nav: f64,
    pub value: f64,
}

fn lookup<N: NavProvider + ?Sized>(navs: &N, isin: &str) -> Result<f64, PortfolioError> {
    navs.nav(isin).ok_or_else(|| PortfolioError::UnknownInstrument {
        isin: isin.to_string(),
    })
}

/// Fold transactions into net units per ISIN
pub fn units_by_isin(transactions: &[Transaction]) -> BTreeMap<String, f64> {
    transactions.iter().fold(BTreeMap::new(), |mut units, trxn| {
        *units.entry(trxn.isin.clone()).or_insert(0.0) += trxn.units;
        units
    })
}

/// Value each instrument's net units at current NAV
pub fn holdings<N: NavProvider + ?Sized>(
    transactions: &[Transaction],
    navs: &N,
) -> Result<Vec<Holding>, PortfolioError> {
    units_by_isin(transactions)
        .into_iter()
        .map(|(isin, units)| {
            let nav = lookup(navs, &isin)?;
            Ok(Holding {
                value: units * nav,
                isin,
                units,
                nav,
            })
        })
        .collect()
}

/// Σ units × NAV over all holdings
pub fn portfolio_value<N: NavProvider + ?Sized>(
    transactions: &[Transaction],
    navs: &N,
) -> Result<f64, PortfolioError> {
    Ok(holdings(transactions, navs)?.iter().map(|h| h.value).sum())
}

/// Σ units × (NAV − purchase price) over all transactions
pub fn portfolio_gain<N: NavProvider + ?Sized>(
    transactions: &[Transaction],
    navs: &N,
) -> Result<f64, PortfolioError> {
    transactions.iter().try_fold(0.0, |gain, trxn| {
        let nav = lookup(navs, &trxn.isin)?;
        Ok(gain + trxn.units * nav - trxn.acquisition_cost())
    })
}
