//! Load transactions from fund statement JSON or plain CSV

use super::transaction::{parse_statement_date, Transaction};
use crate::error::PortfolioError;
use csv::Reader;
use log::info;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Statement layout: `{"data": [{"dtTransaction": [ ... ]}]}`
#[derive(Debug, Deserialize)]
struct StatementDocument {
    #[serde(default)]
    data: Vec<StatementBlock>,
}

#[derive(Debug, Deserialize)]
struct StatementBlock {
    #[serde(rename = "dtTransaction")]
    dt_transaction: Option<Vec<StatementRow>>,
}

/// Raw statement row; numeric fields arrive as numbers or numeric strings
#[derive(Debug, Deserialize)]
struct StatementRow {
    #[serde(rename = "trxnDate")]
    trxn_date: String,
    #[serde(rename = "trxnAmount")]
    trxn_amount: Numeric,
    #[serde(rename = "trxnUnits")]
    trxn_units: Numeric,
    isin: String,
    #[serde(rename = "purchasePrice")]
    purchase_price: Numeric,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn parse(&self, field: &'static str) -> Result<f64, PortfolioError> {
        let value = match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        };
        match value {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(PortfolioError::InvalidNumber {
                field,
                value: match self {
                    Numeric::Number(n) => n.to_string(),
                    Numeric::Text(s) => s.clone(),
                },
            }),
        }
    }
}

impl StatementRow {
    fn to_transaction(self) -> Result<Transaction, PortfolioError> {
        Ok(Transaction {
            date: parse_statement_date(&self.trxn_date)?,
            amount: self.trxn_amount.parse("trxnAmount")?,
            units: self.trxn_units.parse("trxnUnits")?,
            isin: self.isin,
            purchase_price: self.purchase_price.parse("purchasePrice")?,
        })
    }
}

/// Load transactions from a statement JSON reader
pub fn load_transactions_from_reader<R: Read>(
    reader: R,
) -> Result<Vec<Transaction>, PortfolioError> {
    let document: StatementDocument = serde_json::from_reader(reader)?;

    let rows = document
        .data
        .into_iter()
        .next()
        .and_then(|block| block.dt_transaction)
        .ok_or(PortfolioError::MissingTransactions)?;

    rows.into_iter().map(StatementRow::to_transaction).collect()
}

/// Load transactions from a statement JSON file
pub fn load_transactions<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>, PortfolioError> {
    let file = File::open(path.as_ref())?;
    let transactions = load_transactions_from_reader(BufReader::new(file))?;
    info!(
        "loaded {} transactions from {}",
        transactions.len(),
        path.as_ref().display()
    );
    Ok(transactions)
}

/// Load transactions from CSV with header `date,amount,units,isin,purchase_price`
/// and ISO dates
pub fn load_transactions_csv_from_reader<R: Read>(
    reader: R,
) -> Result<Vec<Transaction>, PortfolioError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut transactions = Vec::new();

    for result in csv_reader.deserialize() {
        let trxn: Transaction = result?;
        transactions.push(trxn);
    }

    Ok(transactions)
}

/// Load transactions from a CSV file
pub fn load_transactions_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>, PortfolioError> {
    let transactions = load_transactions_csv_from_reader(File::open(path.as_ref())?)?;
    info!(
        "loaded {} transactions from {}",
        transactions.len(),
        path.as_ref().display()
    );
    Ok(transactions)
}

/// Load a `.csv` file as CSV and anything else as statement JSON
pub fn load_transactions_file<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>, PortfolioError> {
    let is_csv = path
        .as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        load_transactions_csv(path)
    } else {
        load_transactions(path)
    }
}
