//! Error types for loan calculations.

use crate::loan::Field;
use thiserror::Error;

/// A specialized Result type for loan calculations.
pub type LoanResult<T> = Result<T, LoanError>;

/// Errors raised while solving a loan or generating its schedule.
///
/// Non-convergence of the rate solver is not an error; it is reported through
/// [`RateSolution::converged`](crate::rate::RateSolution::converged).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    /// A quantity is non-finite or not strictly positive.
    #[error("invalid {field}: {value} (must be a finite value greater than zero)")]
    InvalidInput {
        /// Name of the offending quantity.
        field: &'static str,
        /// The value that was supplied.
        value: f64,
    },

    /// The computation has no finite answer for these inputs.
    #[error("{operation} is undefined: {reason}")]
    Undefined {
        /// The computation that failed.
        operation: &'static str,
        /// Why it has no answer.
        reason: String,
    },

    /// A known quantity was not supplied.
    #[error("{0} is required but was not supplied")]
    MissingField(Field),

    /// A payment date could not be represented.
    #[error("payment date overflow after {0}")]
    DateOverflow(chrono::NaiveDate),
}

impl LoanError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(field: &'static str, value: f64) -> Self {
        Self::InvalidInput { field, value }
    }

    /// Creates an undefined-result error.
    #[must_use]
    pub fn undefined(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Undefined {
            operation,
            reason: reason.into(),
        }
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn require_positive(field: &'static str, value: f64) -> LoanResult<f64> {
    if value.is_finite() && value > 0. {
        Ok(value)
    } else {
        Err(LoanError::invalid_input(field, value))
    }
}

/// Converts a non-finite result into [`LoanError::Undefined`].
pub(crate) fn require_finite(operation: &'static str, value: f64) -> LoanResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LoanError::undefined(
            operation,
            format!("result is not a finite number ({value})"),
        ))
    }
}
