//! Fixed-rate loan arithmetic: given three of capital, monthly repayment,
//! duration and annual rate, solve for the fourth, and generate the
//! month-by-month amortization schedule.

pub mod error;
pub mod format;
pub mod loan;
pub mod rate;
pub mod schedule;

pub use error::{LoanError, LoanResult};
pub use format::format_amount;
pub use loan::{
    percent_to_rate, rate_to_percent, round_to, solve_capital, solve_duration, solve_repayment,
    Field, LoanParameters, Solved,
};
pub use rate::{solve_rate, RateSolution, SolverConfig};
pub use schedule::{
    generate_schedule, render_dated_report, render_report, AmortizationRow, Schedule,
    ScheduleSummary,
};
