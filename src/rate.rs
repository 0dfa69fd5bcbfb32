//! Newton-Raphson search for the annual rate of a fixed-repayment loan.
//!
//! The residual is `f(r) = repayment - capital * m / (1 - (1 + m)^-n)` with
//! `m = r / 12`. Its derivative is taken analytically with respect to `m`
//! and divided by 12 to get the slope in `r`:
//!
//! `df/dr = -capital * ((1 - v) - m * n * v / (1 + m)) / (1 - v)^2 / 12`
//!
//! where `v = (1 + m)^-n`.

use crate::error::{require_positive, LoanError, LoanResult};
use crate::loan::{monthly_rate, PERIODS_PER_YEAR};
use log::{trace, warn};

/// Default starting annual rate (5%).
pub const DEFAULT_INITIAL_GUESS: f64 = 0.05;

/// Default convergence tolerance on successive annual-rate estimates.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Configuration for [`solve_rate`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Annual rate the iteration starts from.
    pub initial_guess: f64,
    /// Stop once two successive estimates differ by less than this.
    pub tolerance: f64,
    /// Maximum number of Newton steps.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: DEFAULT_INITIAL_GUESS,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_initial_guess(mut self, initial_guess: f64) -> Self {
        self.initial_guess = initial_guess;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of [`solve_rate`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateSolution {
    /// Annual rate as a fraction. The last estimate when not converged.
    pub rate: f64,
    pub converged: bool,
    /// Newton steps taken.
    pub iterations: u32,
}

/// Residual and its slope with respect to the annual rate.
fn residual(capital: f64, repayment: f64, periods: f64, annual_rate: f64) -> (f64, f64) {
    let m = monthly_rate(annual_rate);
    let v = (1. + m).powf(-periods);
    let denom = 1. - v;

    let f = repayment - capital * m / denom;
    // keep `capital *` outermost so an underflowing slope reads as exactly zero
    let dg_dm = capital * (denom - m * periods * v / (1. + m)) / (denom * denom);
    (f, -dg_dm / PERIODS_PER_YEAR)
}

/// Finds the annual rate at which `capital` is repaid by `periods` monthly
/// payments of `repayment`.
///
/// Running out of iterations is not an error: the last estimate comes back
/// with `converged == false`. A zero or non-finite slope, or an estimate that
/// leaves the domain of the repayment formula, is reported as
/// [`LoanError::Undefined`].
pub fn solve_rate(
    capital: f64,
    repayment: f64,
    periods: f64,
    config: &SolverConfig,
) -> LoanResult<RateSolution> {
    let capital = require_positive("capital", capital)?;
    let repayment = require_positive("repayment", repayment)?;
    let periods = require_positive("duration", periods)?;

    if repayment * periods <= capital {
        return Err(LoanError::undefined(
            "rate",
            format!(
                "{} repayments of {} do not exceed the capital {}",
                periods, repayment, capital
            ),
        ));
    }

    let mut rate = config.initial_guess;
    for iteration in 1..=config.max_iterations {
        let (f, df) = residual(capital, repayment, periods, rate);
        trace!(
            "iteration {}: rate {}, residual {}, slope {}",
            iteration,
            rate,
            f,
            df
        );

        if df == 0. || !df.is_finite() || !f.is_finite() {
            return Err(LoanError::undefined(
                "rate",
                format!("slope of the repayment equation is {} at rate {}", df, rate),
            ));
        }

        let next = rate - f / df;
        if !next.is_finite() {
            return Err(LoanError::undefined(
                "rate",
                format!("estimate diverged after {} iterations", iteration),
            ));
        }

        if (next - rate).abs() < config.tolerance {
            return Ok(RateSolution {
                rate: next,
                converged: true,
                iterations: iteration,
            });
        }
        rate = next;
    }

    warn!(
        "Newton-Raphson: no convergence after {} iterations, last estimate {}",
        config.max_iterations, rate
    );
    Ok(RateSolution {
        rate,
        converged: false,
        iterations: config.max_iterations,
    })
}
