//! XIRR root finding
//!
//! Newton-Raphson from a 10% starting guess, falling back to bisection over a
//! fixed scan of the rate domain when Newton stalls on a flat derivative,
//! produces a non-finite value, or runs out of iterations. Each call is a pure
//! function of its inputs: no state survives between calls.

use super::npv::{npv, npv_and_derivative};
use crate::cashflow::CashFlowSeries;
use crate::error::XirrError;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Exclusive lower bound of the bracketing scan
const SCAN_LOWER_BOUND: f64 = -0.99;

/// Inclusive upper bound of the bracketing scan (1000% per year)
const SCAN_UPPER_BOUND: f64 = 10.0;

/// Candidate rates sampled when searching for a sign change, ascending.
/// Denser around zero where realistic portfolio returns sit.
const SCAN_POINTS: [f64; 30] = [
    -0.985, -0.95, -0.9, -0.8, -0.7, -0.6, -0.5, -0.4, -0.3, -0.2,
    -0.1, -0.05, 0.0, 0.05, 0.1, 0.15, 0.2, 0.3, 0.4, 0.5,
    0.75, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0,
];

/// Numeric settings for the solver
///
/// Tolerances on NPV are in currency-normalized units: the NPV is divided by
/// the largest absolute amount in the series before comparison, so the same
/// settings work for a 1,000 and a 10,000,000 portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Starting rate for Newton-Raphson
    pub initial_guess: f64,
    /// Newton iteration cap before falling back to bisection
    pub max_newton_iterations: u32,
    /// Converged when |normalized NPV| is below this
    pub value_tolerance: f64,
    /// Below this |normalized dNPV/dRate| a Newton step is unstable
    pub derivative_epsilon: f64,
    /// Bisection stops once the bracket is narrower than this
    pub bracket_tolerance: f64,
    /// Bisection iteration cap
    pub max_bisection_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: 0.10,
            max_newton_iterations: 100,
            value_tolerance: 1e-7,
            derivative_epsilon: 1e-10,
            bracket_tolerance: 1e-6,
            max_bisection_iterations: 200,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl SolverConfig {
    /// Apply `XIRR_INITIAL_GUESS`, `XIRR_MAX_ITERATIONS` and `XIRR_TOLERANCE`
    /// when they are set and parse; anything else keeps its current value
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(guess) = env_parse("XIRR_INITIAL_GUESS") {
            self.initial_guess = guess;
        }
        if let Some(max_iter) = env_parse("XIRR_MAX_ITERATIONS") {
            self.max_newton_iterations = max_iter;
        }
        if let Some(tolerance) = env_parse("XIRR_TOLERANCE") {
            self.value_tolerance = tolerance;
        }
        self
    }
}

/// Which stage of the solver produced the rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveMethod {
    NewtonRaphson,
    Bisection,
}

/// A converged annualized rate plus how it was reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XirrSolution {
    /// Annualized rate as a decimal (0.10 = 10%)
    pub rate: f64,
    pub method: SolveMethod,
    pub newton_iterations: u32,
    pub bisection_iterations: u32,
}

/// Why Newton-Raphson handed over to bisection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DivergenceReason {
    FlatDerivative,
    NonFinite,
    /// Even the clamped step rounded to -1
    DomainExit,
}

/// Terminal states of the Newton stage
#[derive(Debug, Clone, Copy, PartialEq)]
enum NewtonOutcome {
    Converged { rate: f64, iterations: u32 },
    Diverged { reason: DivergenceReason, iterations: u32 },
    IterationCapExceeded { iterations: u32 },
}

/// Solve for the annualized rate with default settings
pub fn compute_xirr(series: &CashFlowSeries) -> Result<f64, XirrError> {
    solve(series, &SolverConfig::default()).map(|solution| solution.rate)
}

/// Solve for the annualized rate that zeroes the series' NPV
pub fn solve(series: &CashFlowSeries, config: &SolverConfig) -> Result<XirrSolution, XirrError> {
    let scale = series.scale();

    let newton_iterations = match newton(series, config, scale)? {
        NewtonOutcome::Converged { rate, iterations } => {
            debug!("Newton-Raphson converged to {:.8} after {} iterations", rate, iterations);
            return Ok(XirrSolution {
                rate,
                method: SolveMethod::NewtonRaphson,
                newton_iterations: iterations,
                bisection_iterations: 0,
            });
        }
        NewtonOutcome::Diverged { reason, iterations } => {
            warn!(
                "Newton-Raphson diverged ({:?}) after {} iterations, falling back to bisection",
                reason, iterations
            );
            iterations
        }
        NewtonOutcome::IterationCapExceeded { iterations } => {
            warn!(
                "Newton-Raphson hit its {} iteration cap, falling back to bisection",
                iterations
            );
            iterations
        }
    };

    bisect(series, config, scale, newton_iterations)
}

fn newton(
    series: &CashFlowSeries,
    config: &SolverConfig,
    scale: f64,
) -> Result<NewtonOutcome, XirrError> {
    let mut rate = config.initial_guess;
    let mut iteration = 0;

    while iteration < config.max_newton_iterations {
        let (value, derivative) = npv_and_derivative(rate, series)?;
        let value = value / scale;
        let derivative = derivative / scale;
        trace!("newton #{}: rate={} npv={} dnpv={}", iteration, rate, value, derivative);

        if !value.is_finite() || !derivative.is_finite() {
            return Ok(NewtonOutcome::Diverged {
                reason: DivergenceReason::NonFinite,
                iterations: iteration,
            });
        }

        if value.abs() < config.value_tolerance {
            // One last step so the rate still tracks NPV inside the tolerance band
            let refined = if derivative.abs() >= config.derivative_epsilon {
                rate - value / derivative
            } else {
                rate
            };
            return Ok(NewtonOutcome::Converged {
                rate: if refined.is_finite() && refined > -1.0 { refined } else { rate },
                iterations: iteration,
            });
        }

        if derivative.abs() < config.derivative_epsilon {
            return Ok(NewtonOutcome::Diverged {
                reason: DivergenceReason::FlatDerivative,
                iterations: iteration,
            });
        }

        let mut next = rate - value / derivative;
        if !next.is_finite() {
            return Ok(NewtonOutcome::Diverged {
                reason: DivergenceReason::NonFinite,
                iterations: iteration,
            });
        }
        if next <= -1.0 {
            // Halve the distance to -1 instead of stepping past it
            next = (rate - 1.0) / 2.0;
            trace!("newton step left the domain, clamped to {}", next);
            if next <= -1.0 {
                return Ok(NewtonOutcome::Diverged {
                    reason: DivergenceReason::DomainExit,
                    iterations: iteration,
                });
            }
        }

        rate = next;
        iteration += 1;
    }

    Ok(NewtonOutcome::IterationCapExceeded {
        iterations: iteration,
    })
}

/// A sign-change interval `[lo, hi]` with the normalized NPV at `lo`.
/// `lo == hi` marks a scan point that is already a root.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bracket {
    lo: f64,
    hi: f64,
    value_lo: f64,
}

impl Bracket {
    fn distance_to(&self, rate: f64) -> f64 {
        if rate < self.lo {
            self.lo - rate
        } else if rate > self.hi {
            rate - self.hi
        } else {
            0.0
        }
    }
}

/// Scan the fixed sample points for sign changes and keep the bracket
/// closest to the initial guess; ties go to the lower bracket.
fn find_bracket(
    series: &CashFlowSeries,
    config: &SolverConfig,
    scale: f64,
) -> Result<Option<Bracket>, XirrError> {
    let mut samples = Vec::with_capacity(SCAN_POINTS.len());
    for &rate in SCAN_POINTS
        .iter()
        .filter(|&&r| r > SCAN_LOWER_BOUND && r <= SCAN_UPPER_BOUND)
    {
        let value = npv(rate, series)? / scale;
        if value.is_finite() {
            samples.push((rate, value));
        }
    }

    let mut candidates = Vec::new();
    for &(rate, value) in &samples {
        if value == 0.0 {
            candidates.push(Bracket { lo: rate, hi: rate, value_lo: value });
        }
    }
    for pair in samples.windows(2) {
        let (lo, value_lo) = pair[0];
        let (hi, value_hi) = pair[1];
        if value_lo != 0.0 && value_hi != 0.0 && value_lo.signum() != value_hi.signum() {
            candidates.push(Bracket { lo, hi, value_lo });
        }
    }

    let guess = config.initial_guess;
    let best = candidates.into_iter().fold(None::<Bracket>, |best, candidate| match best {
        None => Some(candidate),
        Some(current) => {
            let (d_new, d_cur) = (candidate.distance_to(guess), current.distance_to(guess));
            if d_new < d_cur || (d_new == d_cur && candidate.lo < current.lo) {
                Some(candidate)
            } else {
                Some(current)
            }
        }
    });

    Ok(best)
}

fn bisect(
    series: &CashFlowSeries,
    config: &SolverConfig,
    scale: f64,
    newton_iterations: u32,
) -> Result<XirrSolution, XirrError> {
    let non_convergence = |bisection_iterations| XirrError::NonConvergence {
        newton_iterations,
        bisection_iterations,
    };

    let Some(bracket) = find_bracket(series, config, scale)? else {
        debug!("no sign change in ({}, {}]", SCAN_LOWER_BOUND, SCAN_UPPER_BOUND);
        return Err(non_convergence(0));
    };
    debug!("bisecting bracket [{}, {}]", bracket.lo, bracket.hi);

    let Bracket { mut lo, mut hi, mut value_lo } = bracket;
    let mut iterations = 0;

    while hi - lo >= config.bracket_tolerance {
        if iterations >= config.max_bisection_iterations {
            return Err(non_convergence(iterations));
        }

        let mid = 0.5 * (lo + hi);
        let value_mid = npv(mid, series)? / scale;
        iterations += 1;

        if value_mid.is_nan() {
            return Err(non_convergence(iterations));
        }
        if value_mid == 0.0 {
            lo = mid;
            hi = mid;
            break;
        }

        if value_mid.signum() == value_lo.signum() {
            lo = mid;
            value_lo = value_mid;
        } else {
            hi = mid;
        }
    }

    let rate = 0.5 * (lo + hi);
    debug!("bisection converged to {:.8} after {} iterations", rate, iterations);

    Ok(XirrSolution {
        rate,
        method: SolveMethod::Bisection,
        newton_iterations,
        bisection_iterations: iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::{assemble, CashFlow};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(flows: &[(NaiveDate, f64)]) -> CashFlowSeries {
        let flows: Vec<CashFlow> = flows.iter().map(|&(d, a)| CashFlow::new(d, a)).collect();
        assemble(&flows, None).unwrap()
    }

    fn half_year_series() -> CashFlowSeries {
        // 182 days
        series(&[(date(2021, 1, 1), -1000.0), (date(2021, 7, 2), 1050.0)])
    }

    fn half_year_expected() -> f64 {
        1.05_f64.powf(365.0 / 182.0) - 1.0
    }

    #[test]
    fn test_one_year_ten_percent() {
        let s = series(&[(date(2021, 1, 1), -1000.0), (date(2022, 1, 1), 1100.0)]);
        let solution = solve(&s, &SolverConfig::default()).unwrap();

        assert!((solution.rate - 0.10).abs() < 1e-6, "Expected 10%, got {}", solution.rate);
        assert_eq!(solution.method, SolveMethod::NewtonRaphson);
    }

    #[test]
    fn test_half_year() {
        let rate = compute_xirr(&half_year_series()).unwrap();
        assert!(
            (rate - half_year_expected()).abs() < 1e-6,
            "Expected {}, got {}",
            half_year_expected(),
            rate
        );
    }

    #[test]
    fn test_irregular_flows_zero_npv() {
        let s = series(&[
            (date(2019, 3, 4), -5000.0),
            (date(2019, 9, 18), -2500.0),
            (date(2020, 2, 29), 1200.0),
            (date(2020, 11, 2), -3000.0),
            (date(2023, 6, 30), 13250.0),
        ]);
        let rate = compute_xirr(&s).unwrap();
        let residual = npv(rate, &s).unwrap() / s.scale();

        assert!(rate > 0.0 && rate < 0.2, "Unexpected rate {}", rate);
        assert!(residual.abs() < 1e-7, "Residual NPV {}", residual);
    }

    #[test]
    fn test_clamp_toward_minus_one() {
        // Lost 99% in a year; the first Newton step overshoots below -1
        let s = series(&[(date(2021, 1, 1), -1000.0), (date(2022, 1, 1), 10.0)]);
        let solution = solve(&s, &SolverConfig::default()).unwrap();

        assert!((solution.rate + 0.99).abs() < 1e-6, "Expected -99%, got {}", solution.rate);
        assert_eq!(solution.method, SolveMethod::NewtonRaphson);
    }

    #[test]
    fn test_flat_derivative_falls_back_to_bisection() {
        let config = SolverConfig {
            derivative_epsilon: f64::MAX,
            ..SolverConfig::default()
        };
        let solution = solve(&half_year_series(), &config).unwrap();

        assert_eq!(solution.method, SolveMethod::Bisection);
        assert_eq!(solution.newton_iterations, 0);
        assert!((solution.rate - half_year_expected()).abs() < 1e-6);
    }

    #[test]
    fn test_newton_cap_falls_back_to_bisection() {
        let config = SolverConfig {
            max_newton_iterations: 0,
            ..SolverConfig::default()
        };
        let solution = solve(&half_year_series(), &config).unwrap();

        assert_eq!(solution.method, SolveMethod::Bisection);
        assert!(solution.bisection_iterations > 0);
        assert!(solution.bisection_iterations <= config.max_bisection_iterations);
        assert!((solution.rate - half_year_expected()).abs() < 1e-6);
    }

    #[test]
    fn test_root_outside_scan_is_non_convergence() {
        // True rate is 9900%, beyond the bisection scan
        let s = series(&[(date(2021, 1, 1), -1.0), (date(2022, 1, 1), 100.0)]);
        let config = SolverConfig {
            max_newton_iterations: 0,
            ..SolverConfig::default()
        };

        match solve(&s, &config) {
            Err(XirrError::NonConvergence { bisection_iterations, .. }) => {
                assert_eq!(bisection_iterations, 0)
            }
            other => panic!("Expected NonConvergence, got {:?}", other),
        }
    }

    #[test]
    fn test_newton_finds_root_outside_scan() {
        let s = series(&[(date(2021, 1, 1), -1.0), (date(2022, 1, 1), 100.0)]);
        let rate = compute_xirr(&s).unwrap();
        assert!((rate - 99.0).abs() < 1e-3, "Expected 9900%, got {}", rate);
    }

    #[test]
    fn test_no_real_root_is_non_convergence() {
        // 100 - 300v + 250v^2 > 0 for every discount factor v
        let s = series(&[
            (date(2021, 1, 1), 100.0),
            (date(2022, 1, 1), -300.0),
            (date(2023, 1, 1), 250.0),
        ]);

        assert!(matches!(
            compute_xirr(&s),
            Err(XirrError::NonConvergence { .. })
        ));
    }

    #[test]
    fn test_bisection_with_tiny_cap_is_non_convergence() {
        let config = SolverConfig {
            max_newton_iterations: 0,
            max_bisection_iterations: 3,
            ..SolverConfig::default()
        };

        match solve(&half_year_series(), &config) {
            Err(XirrError::NonConvergence { bisection_iterations, .. }) => {
                assert_eq!(bisection_iterations, 3)
            }
            other => panic!("Expected NonConvergence, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_initial_guess_is_domain_error() {
        let config = SolverConfig {
            initial_guess: -1.0,
            ..SolverConfig::default()
        };

        assert!(matches!(
            solve(&half_year_series(), &config),
            Err(XirrError::DomainError { .. })
        ));
    }

    #[test]
    fn test_bracket_prefers_interval_nearest_guess() {
        // Roots at 12% and 45%: -(1 - 1.12v)(1 - 1.45v) with v = 1/(1+r)
        let s = series(&[
            (date(2021, 1, 1), -1.0),
            (date(2022, 1, 1), 2.57),
            (date(2023, 1, 1), -1.624),
        ]);
        let config = SolverConfig {
            initial_guess: 0.5,
            max_newton_iterations: 0,
            ..SolverConfig::default()
        };
        let solution = solve(&s, &config).unwrap();

        assert!((solution.rate - 0.45).abs() < 1e-6, "Expected 45%, got {}", solution.rate);
    }

    #[test]
    fn test_clamp_rounding_to_minus_one_is_domain_exit() {
        // Starting one ulp above -1, the halved step rounds onto -1 itself
        let s = series(&[(date(2021, 1, 1), -1000.0), (date(2021, 1, 2), 100.0)]);
        let config = SolverConfig {
            initial_guess: -1.0 + f64::EPSILON / 2.0,
            ..SolverConfig::default()
        };

        assert_eq!(
            newton(&s, &config, s.scale()).unwrap(),
            NewtonOutcome::Diverged {
                reason: DivergenceReason::DomainExit,
                iterations: 0,
            }
        );
    }

    #[test]
    fn test_converged_guess_is_refined() {
        // The 10% guess is already within tolerance for a terminal of 1100.0001
        let s = series(&[(date(2021, 1, 1), -1000.0), (date(2022, 1, 1), 1100.0001)]);
        let solution = solve(&s, &SolverConfig::default()).unwrap();

        assert_eq!(solution.newton_iterations, 0);
        assert!(solution.rate > 0.10, "Expected refinement above 10%, got {}", solution.rate);
        assert!((solution.rate - 0.1000001).abs() < 1e-9);
    }

    #[test]
    fn test_env_overrides() {
        // The only test that touches XIRR_* variables
        env::set_var("XIRR_INITIAL_GUESS", "0.25");
        env::set_var("XIRR_MAX_ITERATIONS", "not-a-number");
        env::set_var("XIRR_TOLERANCE", "1e-9");

        let config = SolverConfig::default().with_env_overrides();

        env::remove_var("XIRR_INITIAL_GUESS");
        env::remove_var("XIRR_MAX_ITERATIONS");
        env::remove_var("XIRR_TOLERANCE");

        assert_eq!(config.initial_guess, 0.25);
        assert_eq!(config.value_tolerance, 1e-9);
        // Unparseable values keep the current setting
        assert_eq!(config.max_newton_iterations, 100);
        assert_eq!(config.bracket_tolerance, SolverConfig::default().bracket_tolerance);
    }
}
