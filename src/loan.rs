use crate::error::{require_finite, require_positive, LoanError, LoanResult};
use crate::rate::{solve_rate, SolverConfig};
use log::debug;
use std::fmt;

/// Number of repayments per year. All rates compound monthly.
pub const PERIODS_PER_YEAR: f64 = 12.;

/// The four quantities of a fixed-rate loan. Exactly one of them is solved
/// for at a time; the other three are inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Field {
    Capital,
    Duration,
    Repayment,
    Rate,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Capital,
        Field::Duration,
        Field::Repayment,
        Field::Rate,
    ];

    /// The three fields a caller should accept input for when `self` is the
    /// one being computed.
    pub fn editable_fields(self) -> [Field; 3] {
        let mut out = [self; 3];
        let mut i = 0;
        for field in Field::ALL {
            if field != self {
                out[i] = field;
                i += 1;
            }
        }
        out
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Capital => "capital",
            Field::Duration => "duration",
            Field::Repayment => "repayment",
            Field::Rate => "rate",
        };
        f.write_str(name)
    }
}

/// Loan quantities as entered by the caller. Any of them may be missing;
/// the one being solved for usually is.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoanParameters {
    pub capital: Option<f64>,
    pub repayment: Option<f64>,
    /// Number of monthly periods. May be fractional.
    pub duration: Option<f64>,
    /// Annual rate as a fraction, i.e. 0.0742 for 7.42%.
    pub annual_rate: Option<f64>,
}

/// The outcome of [`LoanParameters::solve`].
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Solved {
    pub field: Field,
    pub value: f64,
    /// Always true for the closed-form fields. False when the rate solver
    /// ran out of iterations and `value` is its last estimate.
    pub converged: bool,
}

impl LoanParameters {
    pub fn new(capital: f64, repayment: f64, duration: f64, annual_rate: f64) -> Self {
        Self {
            capital: Some(capital),
            repayment: Some(repayment),
            duration: Some(duration),
            annual_rate: Some(annual_rate),
        }
    }

    pub fn with_capital(mut self, capital: f64) -> Self {
        self.capital = Some(capital);
        self
    }

    pub fn with_repayment(mut self, repayment: f64) -> Self {
        self.repayment = Some(repayment);
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_annual_rate(mut self, annual_rate: f64) -> Self {
        self.annual_rate = Some(annual_rate);
        self
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Capital => self.capital,
            Field::Duration => self.duration,
            Field::Repayment => self.repayment,
            Field::Rate => self.annual_rate,
        }
    }

    /// Returns a copy with `field` set to `value`.
    pub fn with_solved(self, field: Field, value: f64) -> Self {
        match field {
            Field::Capital => self.with_capital(value),
            Field::Duration => self.with_duration(value),
            Field::Repayment => self.with_repayment(value),
            Field::Rate => self.with_annual_rate(value),
        }
    }

    fn known(&self, field: Field) -> LoanResult<f64> {
        self.get(field).ok_or(LoanError::MissingField(field))
    }

    /// Computes `target` from the other three quantities. Whatever value
    /// `target` currently holds is ignored.
    pub fn solve(&self, target: Field, config: &SolverConfig) -> LoanResult<Solved> {
        let (value, converged) = match target {
            Field::Capital => (
                solve_capital(
                    self.known(Field::Repayment)?,
                    self.known(Field::Duration)?,
                    self.known(Field::Rate)?,
                )?,
                true,
            ),
            Field::Duration => (
                solve_duration(
                    self.known(Field::Capital)?,
                    self.known(Field::Repayment)?,
                    self.known(Field::Rate)?,
                )?,
                true,
            ),
            Field::Repayment => (
                solve_repayment(
                    self.known(Field::Capital)?,
                    self.known(Field::Duration)?,
                    self.known(Field::Rate)?,
                )?,
                true,
            ),
            Field::Rate => {
                let solution = solve_rate(
                    self.known(Field::Capital)?,
                    self.known(Field::Repayment)?,
                    self.known(Field::Duration)?,
                    config,
                )?;
                (solution.rate, solution.converged)
            }
        };
        debug!("solved {} = {} (converged: {})", target, value, converged);
        Ok(Solved {
            field: target,
            value,
            converged,
        })
    }
}

pub fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / PERIODS_PER_YEAR
}

/// Converts a user-facing percentage (7.42) into a fraction (0.0742).
pub fn percent_to_rate(percent: f64) -> f64 {
    percent / 100.
}

pub fn rate_to_percent(rate: f64) -> f64 {
    rate * 100.
}

/// Rounds `amt` to `places` decimal places, half away from zero.
pub fn round_to(amt: f64, places: u32) -> f64 {
    if amt == 0. {
        0.
    } else {
        let scale = 10_f64.powi(places as i32);
        (amt * scale).round() / scale
    }
}

/// Present value of `periods` monthly repayments of `repayment`.
pub fn solve_capital(repayment: f64, periods: f64, annual_rate: f64) -> LoanResult<f64> {
    let repayment = require_positive("repayment", repayment)?;
    let periods = require_positive("duration", periods)?;
    let m = monthly_rate(require_positive("rate", annual_rate)?);

    require_finite("capital", repayment * (1. - (1. + m).powf(-periods)) / m)
}

/// Monthly repayment that clears `capital` in `periods` months.
pub fn solve_repayment(capital: f64, periods: f64, annual_rate: f64) -> LoanResult<f64> {
    let capital = require_positive("capital", capital)?;
    let periods = require_positive("duration", periods)?;
    let m = monthly_rate(require_positive("rate", annual_rate)?);

    require_finite("repayment", capital * m / (1. - (1. + m).powf(-periods)))
}

/// Number of monthly periods (possibly fractional) needed to clear `capital`.
///
/// Fails when the repayment does not exceed the first month's interest, since
/// the balance would never decrease.
pub fn solve_duration(capital: f64, repayment: f64, annual_rate: f64) -> LoanResult<f64> {
    let capital = require_positive("capital", capital)?;
    let repayment = require_positive("repayment", repayment)?;
    let m = monthly_rate(require_positive("rate", annual_rate)?);

    let interest = capital * m;
    if interest >= repayment {
        return Err(LoanError::undefined(
            "duration",
            format!(
                "repayment {} does not cover the monthly interest {}",
                repayment, interest
            ),
        ));
    }

    require_finite("duration", -(1. - interest / repayment).ln() / m.ln_1p())
}
