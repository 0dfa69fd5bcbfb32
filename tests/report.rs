use chrono::NaiveDate;
use loan_solver::{
    generate_schedule, render_dated_report, render_report, solve_rate, solve_repayment,
    Field, LoanParameters, ScheduleSummary, SolverConfig,
};
use test_log::test;

#[test]
fn test_report_layout() {
    let report = render_report(generate_schedule(1000., 600., 5., 0.12).unwrap());
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(
        lines,
        vec![
            "  Period |        Interest |       Principal |       Remaining",
            "--------------------------------------------------------------",
            "       1 |           10,00 |          590,00 |          410,00",
            "       2 |            4,10 |          410,00 |            0,00",
        ]
    );
    assert!(report.ends_with('\n'));
}

#[test]
fn test_report_columns_align() {
    let report = render_report(generate_schedule(250000., 2000., 240., 0.0742).unwrap());
    let widths: Vec<usize> = report.lines().map(|line| line.chars().count()).collect();

    assert!(widths.len() > 2);
    assert!(widths.iter().all(|&w| w == 62));
    assert!(report.contains("1 545,83"));
}

#[test]
fn test_dated_report() {
    let first = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let report =
        render_dated_report(generate_schedule(1000., 600., 5., 0.12).unwrap(), first).unwrap();
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(
        lines[0],
        "  Period |       Date |        Interest |       Principal |       Remaining"
    );
    assert_eq!(lines[1], "-".repeat(75));
    assert_eq!(
        lines[2],
        "       1 | 2024-01-31 |           10,00 |          590,00 |          410,00"
    );
    assert!(lines[3].contains("2024-02-29"));
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_solve_then_schedule() {
    // solve the repayment, then fill it in and amortize over the full term
    let config = SolverConfig::default();
    let params = LoanParameters::default()
        .with_capital(15000.)
        .with_duration(48.)
        .with_annual_rate(0.0742);
    let solved = params.solve(Field::Repayment, &config).unwrap();
    let params = params.with_solved(Field::Repayment, solved.value);

    let summary: ScheduleSummary = loan_solver::Schedule::from_parameters(&params)
        .unwrap()
        .collect();
    assert!(summary.payments == 47 || summary.payments == 48);
    assert!(summary.final_balance < 1e-6);
    assert!((summary.total_principal - 15000.).abs() < 1e-6);
    assert!((summary.total_paid - solved.value * 48.).abs() < 1e-4);

    let rate = solve_rate(15000., solved.value, 48., &config).unwrap();
    assert!(rate.converged);
    assert!((rate.rate - 0.0742).abs() < 1e-9);
}

#[test]
fn test_empty_report_for_sub_month_duration() {
    let repayment = solve_repayment(1000., 0.5, 0.12).unwrap();
    let report = render_report(generate_schedule(1000., repayment, 0.5, 0.12).unwrap());
    assert_eq!(report.lines().count(), 2);
}
