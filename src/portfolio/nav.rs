//! Current NAV lookup by instrument identifier

use crate::error::PortfolioError;
use csv::Reader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Source of current per-unit prices
pub trait NavProvider {
    /// Current NAV for `isin`, or `None` when the instrument is unknown
    fn nav(&self, isin: &str) -> Option<f64>;
}

/// In-memory NAV table keyed by ISIN
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavTable {
    navs: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct NavRow {
    isin: String,
    nav: f64,
}

impl NavTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference NAVs for the three sample funds
    pub fn sample() -> Self {
        let mut table = Self::new();
        table.insert("INF209K01UN8", 67.58);
        table.insert("INF090I01JR0", 76.4465);
        table.insert("INF194K01Y29", 179.550);
        table
    }

    pub fn insert(&mut self, isin: impl Into<String>, nav: f64) {
        self.navs.insert(isin.into(), nav);
    }

    pub fn len(&self) -> usize {
        self.navs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.navs.is_empty()
    }

    /// Load NAVs from CSV with header `isin,nav`
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PortfolioError> {
        let mut csv_reader = Reader::from_reader(reader);
        let mut table = Self::new();

        for result in csv_reader.deserialize() {
            let row: NavRow = result?;
            if !row.nav.is_finite() || row.nav < 0.0 {
                return Err(PortfolioError::InvalidNumber {
                    field: "nav",
                    value: row.nav.to_string(),
                });
            }
            table.insert(row.isin, row.nav);
        }

        Ok(table)
    }

    /// Load NAVs from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, PortfolioError> {
        Self::from_reader(std::fs::File::open(path)?)
    }
}

impl NavProvider for NavTable {
    fn nav(&self, isin: &str) -> Option<f64> {
        self.navs.get(isin).copied()
    }
}
