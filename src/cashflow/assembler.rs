//! Validation and filtering of raw cash flows before root finding
//!
//! This is the single place where series invariants are checked. The NPV
//! evaluator and the solver trust an assembled series and never re-check
//! ordering or signs per iteration.

use super::{CashFlow, CashFlowSeries};
use crate::error::XirrError;
use log::debug;

/// Build a validated series from raw transactional flows plus an optional
/// terminal valuation.
///
/// - zero-amount entries are dropped
/// - flows are sorted by date (stable, so same-day order is preserved)
/// - the terminal flow must be non-negative and dated no earlier than any
///   non-zero flow, and is appended last
/// - the result must contain at least one outflow and one inflow
pub fn assemble(
    raw_flows: &[CashFlow],
    terminal: Option<CashFlow>,
) -> Result<CashFlowSeries, XirrError> {
    if let Some(bad) = raw_flows.iter().find(|cf| !cf.amount.is_finite()) {
        return Err(XirrError::invalid(format!(
            "non-finite amount {} on {}",
            bad.amount, bad.date
        )));
    }

    let mut flows: Vec<CashFlow> = raw_flows
        .iter()
        .copied()
        .filter(|cf| cf.amount != 0.0)
        .collect();
    let dropped = raw_flows.len() - flows.len();
    flows.sort_by_key(|cf| cf.date);

    if let Some(terminal) = terminal {
        if !terminal.amount.is_finite() || terminal.amount < 0.0 {
            return Err(XirrError::invalid(format!(
                "terminal valuation must be a non-negative amount, got {}",
                terminal.amount
            )));
        }
        if let Some(latest) = flows.last().map(|cf| cf.date) {
            if terminal.date < latest {
                return Err(XirrError::invalid(format!(
                    "terminal valuation dated {} precedes transaction dated {}",
                    terminal.date, latest
                )));
            }
        }
        // An empty portfolio carries no information, same as any zero flow
        if terminal.amount > 0.0 {
            flows.push(terminal);
        }
    }

    if flows.is_empty() {
        return Err(XirrError::invalid("no non-zero cash flows"));
    }
    if !flows.iter().any(CashFlow::is_outflow) {
        return Err(XirrError::invalid("no negative (invested) amount"));
    }
    if !flows.iter().any(CashFlow::is_inflow) {
        return Err(XirrError::invalid("no positive (received) amount"));
    }

    debug!(
        "assembled {} cash flows ({} zero-amount entries dropped)",
        flows.len(),
        dropped
    );

    Ok(CashFlowSeries::from_validated(flows))
}
