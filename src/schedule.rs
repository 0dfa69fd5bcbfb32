use crate::error::{require_positive, LoanError, LoanResult};
use crate::format::{align_right, format_amount};
use crate::loan::{monthly_rate, Field, LoanParameters};
use chrono::{Months, NaiveDate};
use log::{debug, trace};
use std::{fmt, iter::FusedIterator};

pub const PERIOD_WIDTH: usize = 8;
pub const DATE_WIDTH: usize = 10;
pub const AMOUNT_WIDTH: usize = 15;
const COLUMN_SEPARATOR: &str = " | ";

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AmortizationRow {
    pub period: u32,
    pub interest: f64,
    pub principal: f64,
    /// Balance left after this period's repayment.
    pub remaining: f64,
}

impl fmt::Display for AmortizationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "period {}, interest {}, principal {}, remaining {}",
            self.period,
            format_amount(self.interest),
            format_amount(self.principal),
            format_amount(self.remaining)
        )
    }
}

/// Lazily computed amortization rows for a fully specified loan.
///
/// Yields one row per month up to `floor(duration)` and stops early once the
/// balance reaches zero. On the final row the principal is capped at the
/// balance that was left, so the principal portions always sum to the capital
/// of a loan that gets paid off. A repayment too small to cover the interest
/// produces zero principal and a balance that never decreases.
#[derive(Clone, Debug)]
pub struct Schedule {
    repayment: f64,
    monthly_rate: f64,
    remaining: f64,
    period: u32,
    last_period: u32,
}

/// Builds the schedule for `capital` repaid by `repayment` a month over
/// `periods` months at `annual_rate`.
///
/// Every input must be finite and greater than zero.
pub fn generate_schedule(
    capital: f64,
    repayment: f64,
    periods: f64,
    annual_rate: f64,
) -> LoanResult<Schedule> {
    let capital = require_positive("capital", capital)?;
    let repayment = require_positive("repayment", repayment)?;
    let periods = require_positive("duration", periods)?;
    let annual_rate = require_positive("rate", annual_rate)?;

    // saturates for absurdly long durations
    let last_period = periods.floor() as u32;
    debug!(
        "schedule: capital {}, repayment {}, {} periods, rate {}",
        capital, repayment, last_period, annual_rate
    );

    Ok(Schedule {
        repayment,
        monthly_rate: monthly_rate(annual_rate),
        remaining: capital,
        period: 0,
        last_period,
    })
}

impl Schedule {
    /// Builds the schedule from parameters with all four quantities present.
    pub fn from_parameters(params: &LoanParameters) -> LoanResult<Self> {
        let known = |field: Field| params.get(field).ok_or(LoanError::MissingField(field));
        generate_schedule(
            known(Field::Capital)?,
            known(Field::Repayment)?,
            known(Field::Duration)?,
            known(Field::Rate)?,
        )
    }

    /// The nominal number of periods, `floor(duration)`.
    pub fn last_period(&self) -> u32 {
        self.last_period
    }

    pub fn summary(self) -> ScheduleSummary {
        self.collect()
    }
}

impl Iterator for Schedule {
    type Item = AmortizationRow;

    fn next(&mut self) -> Option<AmortizationRow> {
        if self.period >= self.last_period || self.remaining <= 0. {
            return None;
        }
        self.period += 1;

        let interest = self.remaining * self.monthly_rate;
        let principal = (self.repayment - interest).max(0.).min(self.remaining);
        self.remaining = (self.remaining - principal).max(0.);

        let row = AmortizationRow {
            period: self.period,
            interest,
            principal,
            remaining: self.remaining,
        };
        trace!("{}", row);
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining <= 0. {
            return (0, Some(0));
        }
        let left = self.last_period.saturating_sub(self.period) as usize;
        (left.min(1), Some(left))
    }
}

impl FusedIterator for Schedule {}

fn table_head(dated: bool) -> String {
    let mut columns = vec![align_right("Period", PERIOD_WIDTH)];
    if dated {
        columns.push(align_right("Date", DATE_WIDTH));
    }
    for title in ["Interest", "Principal", "Remaining"] {
        columns.push(align_right(title, AMOUNT_WIDTH));
    }

    let mut width = PERIOD_WIDTH + 3 * (COLUMN_SEPARATOR.len() + AMOUNT_WIDTH);
    if dated {
        width += COLUMN_SEPARATOR.len() + DATE_WIDTH;
    }
    format!("{}\n{}\n", columns.join(COLUMN_SEPARATOR), "-".repeat(width))
}

fn render_row(row: &AmortizationRow, date: Option<NaiveDate>) -> String {
    let mut columns = vec![align_right(&row.period.to_string(), PERIOD_WIDTH)];
    if let Some(date) = date {
        columns.push(align_right(&date.to_string(), DATE_WIDTH));
    }
    for amount in [row.interest, row.principal, row.remaining] {
        columns.push(align_right(&format_amount(amount), AMOUNT_WIDTH));
    }
    columns.join(COLUMN_SEPARATOR)
}

/// Renders rows as the fixed-width `Period | Interest | Principal | Remaining`
/// table, one line per row after a header and a dashed separator.
pub fn render_report<I>(rows: I) -> String
where
    I: IntoIterator<Item = AmortizationRow>,
{
    let mut out = table_head(false);
    for row in rows {
        out.push_str(&render_row(&row, None));
        out.push('\n');
    }
    out
}

/// Same as [`render_report`] with a `Date` column after `Period`, the first
/// row falling on `first_payment` and each following row one month later.
pub fn render_dated_report<I>(rows: I, first_payment: NaiveDate) -> LoanResult<String>
where
    I: IntoIterator<Item = AmortizationRow>,
{
    let mut out = table_head(true);
    for row in rows {
        let date = payment_date(first_payment, row.period)?;
        out.push_str(&render_row(&row, Some(date)));
        out.push('\n');
    }
    Ok(out)
}

/// Date of payment `period` (1-based) when the first falls on `first`.
///
/// Counted from `first` rather than stepped, so a schedule starting on the
/// 31st returns to the 31st in long months instead of drifting.
pub fn payment_date(first: NaiveDate, period: u32) -> LoanResult<NaiveDate> {
    first
        .checked_add_months(Months::new(period.saturating_sub(1)))
        .ok_or(LoanError::DateOverflow(first))
}

/// Totals over a schedule.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleSummary {
    pub payments: u32,
    pub total_interest: f64,
    pub total_principal: f64,
    pub total_paid: f64,
    /// Balance after the last row; zero when the loan is paid off.
    pub final_balance: f64,
}

impl FromIterator<AmortizationRow> for ScheduleSummary {
    fn from_iter<I: IntoIterator<Item = AmortizationRow>>(rows: I) -> Self {
        rows.into_iter()
            .fold(ScheduleSummary::default(), |acc, row| ScheduleSummary {
                payments: acc.payments + 1,
                total_interest: acc.total_interest + row.interest,
                total_principal: acc.total_principal + row.principal,
                total_paid: acc.total_paid + row.interest + row.principal,
                final_balance: row.remaining,
            })
    }
}

impl fmt::Display for ScheduleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Payments:        {}", self.payments)?;
        writeln!(f, "Total interest:  {}", format_amount(self.total_interest))?;
        writeln!(f, "Total principal: {}", format_amount(self.total_principal))?;
        writeln!(f, "Total paid:      {}", format_amount(self.total_paid))?;
        write!(f, "Final balance:   {}", format_amount(self.final_balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_log::test;

    #[test]
    fn test_pays_off_before_duration() {
        let rows: Vec<_> = generate_schedule(10000., 500., 24., 0.12).unwrap().collect();

        assert_eq!(rows.len(), 23);
        assert_eq!(
            rows[0],
            AmortizationRow {
                period: 1,
                interest: 100.,
                principal: 400.,
                remaining: 9600.,
            }
        );
        let last = rows.last().unwrap();
        assert_eq!(last.period, 23);
        assert_eq!(last.remaining, 0.);
        assert_relative_eq!(last.principal, 211.3656, epsilon = 1e-4);

        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.period as usize, i + 1);
            assert!(row.principal >= 0.);
            assert!(row.remaining >= 0.);
            if row.period < 23 {
                assert_relative_eq!(row.principal + row.interest, 500., epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_bounded_by_duration() {
        // 36 months are needed, only 12 are requested
        let repayment = crate::loan::solve_repayment(10000., 36., 0.07).unwrap();
        let schedule = generate_schedule(10000., repayment, 12.9, 0.07).unwrap();
        assert_eq!(schedule.last_period(), 12);

        let rows: Vec<_> = schedule.collect();
        assert_eq!(rows.len(), 12);
        assert!(rows[11].remaining > 0.);
    }

    #[test]
    fn test_full_term_ends_at_zero() {
        let repayment = crate::loan::solve_repayment(200000., 180., 0.07).unwrap();
        let summary = generate_schedule(200000., repayment, 180., 0.07)
            .unwrap()
            .summary();

        assert!(summary.payments == 179 || summary.payments == 180);
        assert_relative_eq!(summary.final_balance, 0., epsilon = 1e-6);
        assert_relative_eq!(summary.total_principal, 200000., epsilon = 1e-6);
    }

    #[test]
    fn test_repayment_below_interest_never_pays_down() {
        let rows: Vec<_> = generate_schedule(10000., 50., 24., 0.12).unwrap().collect();

        assert_eq!(rows.len(), 24);
        for row in rows {
            assert_eq!(row.principal, 0.);
            assert_eq!(row.interest, 100.);
            assert_eq!(row.remaining, 10000.);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            generate_schedule(-1., 500., 24., 0.12).unwrap_err(),
            LoanError::invalid_input("capital", -1.)
        );
        assert!(generate_schedule(10000., 0., 24., 0.12).is_err());
        assert!(generate_schedule(10000., 500., -24., 0.12).is_err());
        assert!(generate_schedule(10000., 500., 24., 0.).is_err());
    }

    #[test]
    fn test_from_parameters() {
        let params = LoanParameters::new(10000., 500., 24., 0.12);
        assert_eq!(Schedule::from_parameters(&params).unwrap().count(), 23);

        let params = LoanParameters::default().with_capital(10000.);
        assert_eq!(
            Schedule::from_parameters(&params).unwrap_err(),
            LoanError::MissingField(Field::Repayment)
        );
    }

    #[test]
    fn test_deterministic() {
        let a: Vec<_> = generate_schedule(5000., 300., 20., 0.05).unwrap().collect();
        let b: Vec<_> = generate_schedule(5000., 300., 20., 0.05).unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fused() {
        let mut schedule = generate_schedule(1000., 600., 5., 0.12).unwrap();
        assert_eq!(schedule.next().map(|r| r.period), Some(1));
        assert_eq!(schedule.next().map(|r| r.remaining), Some(0.));
        assert_eq!(schedule.next(), None);
        assert_eq!(schedule.next(), None);
    }

    #[test]
    fn test_payment_date() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(payment_date(first, 1).unwrap(), first);
        assert_eq!(
            payment_date(first, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            payment_date(first, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
        );
        assert_eq!(
            payment_date(first, 13).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert_eq!(
            payment_date(NaiveDate::MAX, 2),
            Err(LoanError::DateOverflow(NaiveDate::MAX))
        );
    }

    #[test]
    fn test_row_display() {
        let row = AmortizationRow {
            period: 3,
            interest: 1234.5,
            principal: 10.,
            remaining: 1000000.,
        };
        assert_eq!(
            row.to_string(),
            "period 3, interest 1 234,50, principal 10,00, remaining 1 000 000,00"
        );
    }
}
