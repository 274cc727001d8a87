//! Error types for the XIRR core and its portfolio collaborators

use thiserror::Error;

/// Failures of the XIRR core (assembly, evaluation, root finding)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XirrError {
    /// Series is empty after filtering, lacks both signs, or violates date ordering
    #[error("invalid cash flow input: {reason}")]
    InvalidInput { reason: String },

    /// A rate at or below -100% was handed to the NPV evaluator
    #[error("rate {rate} is outside the valid domain (rate must be > -1)")]
    DomainError { rate: f64 },

    /// Newton-Raphson and the bisection fallback both exhausted their caps
    #[error(
        "XIRR did not converge (newton iterations: {newton_iterations}, \
         bisection iterations: {bisection_iterations})"
    )]
    NonConvergence {
        newton_iterations: u32,
        bisection_iterations: u32,
    },
}

impl XirrError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        XirrError::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Failures while loading or valuing a portfolio
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("transaction document has no data[0].dtTransaction list")]
    MissingTransactions,

    #[error("unparseable date '{value}'")]
    InvalidDate { value: String },

    #[error("field '{field}' is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("no NAV available for instrument {isin}")]
    UnknownInstrument { isin: String },

    #[error(transparent)]
    Xirr(#[from] XirrError),
}
