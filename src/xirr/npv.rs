//! Net present value of a dated series and its derivative with respect to rate

use super::day_count::years_between;
use crate::cashflow::CashFlowSeries;
use crate::error::XirrError;

/// Reject rates where `1 + rate` is non-positive (or not a number)
fn check_domain(rate: f64) -> Result<(), XirrError> {
    if rate > -1.0 {
        Ok(())
    } else {
        Err(XirrError::DomainError { rate })
    }
}

/// NPV = Σ amount_i / (1 + rate)^t_i, with t_i in Actual/365 years from the anchor
pub fn npv(rate: f64, series: &CashFlowSeries) -> Result<f64, XirrError> {
    check_domain(rate)?;

    let anchor = series.anchor();
    let base = 1.0 + rate;

    Ok(series
        .flows()
        .iter()
        .map(|cf| cf.amount / base.powf(years_between(cf.date, anchor)))
        .sum())
}

/// dNPV/dRate = Σ -t_i · amount_i / (1 + rate)^(t_i + 1)
pub fn npv_derivative(rate: f64, series: &CashFlowSeries) -> Result<f64, XirrError> {
    npv_and_derivative(rate, series).map(|(_, dnpv)| dnpv)
}

/// NPV and its derivative in a single pass over the series
pub fn npv_and_derivative(rate: f64, series: &CashFlowSeries) -> Result<(f64, f64), XirrError> {
    check_domain(rate)?;

    let anchor = series.anchor();
    let base = 1.0 + rate;
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for cf in series.flows() {
        let t = years_between(cf.date, anchor);
        let discounted = cf.amount / base.powf(t);
        npv += discounted;
        // amount / base^(t+1) == discounted / base
        dnpv -= t * discounted / base;
    }

    Ok((npv, dnpv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::{assemble, CashFlow};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn one_year_series() -> CashFlowSeries {
        assemble(
            &[
                CashFlow::new(date(2021, 1, 1), -1000.0),
                CashFlow::new(date(2022, 1, 1), 1100.0),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_npv_zero_rate_is_plain_sum() {
        let series = one_year_series();
        assert_relative_eq!(npv(0.0, &series).unwrap(), 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_npv_at_irr_is_zero() {
        let series = one_year_series();
        assert!(npv(0.10, &series).unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_derivative_two_flows() {
        // -1 * 1100 / 1.1^2
        let series = one_year_series();
        let dnpv = npv_derivative(0.10, &series).unwrap();
        assert_relative_eq!(dnpv, -1100.0 / 1.21, max_relative = 1e-12);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let series = assemble(
            &[
                CashFlow::new(date(2020, 1, 1), -1000.0),
                CashFlow::new(date(2020, 5, 17), -250.0),
                CashFlow::new(date(2021, 2, 3), 400.0),
                CashFlow::new(date(2022, 9, 30), 1100.0),
            ],
            None,
        )
        .unwrap();

        let rate = 0.07;
        let h = 1e-6;
        let numeric =
            (npv(rate + h, &series).unwrap() - npv(rate - h, &series).unwrap()) / (2.0 * h);
        let (_, analytic) = npv_and_derivative(rate, &series).unwrap();

        assert_relative_eq!(analytic, numeric, max_relative = 1e-6);
    }

    #[test]
    fn test_rate_at_or_below_minus_one_is_domain_error() {
        let series = one_year_series();
        for rate in [-1.0, -1.5, f64::NAN] {
            match npv(rate, &series) {
                Err(XirrError::DomainError { .. }) => {}
                other => panic!("Expected DomainError for rate {}, got {:?}", rate, other),
            }
            assert!(npv_and_derivative(rate, &series).is_err());
        }
    }
}
