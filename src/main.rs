use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn, LevelFilter};
use loan_solver::rate::{DEFAULT_INITIAL_GUESS, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use loan_solver::{
    format_amount, percent_to_rate, rate_to_percent, render_dated_report, render_report,
    round_to, Field, LoanParameters, LoanResult, Schedule, ScheduleSummary, Solved,
    SolverConfig,
};
use simple_logger::SimpleLogger;
use std::process;

/// Fixed-rate loan calculator
#[derive(Parser)]
#[command(
    name = "loancalc",
    version,
    about = "Fixed-rate loan calculator with monthly repayments",
    long_about = "Solves for whichever of capital, repayment, duration or rate is \
                  missing, or prints the month-by-month amortization schedule."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the missing quantity from the other three
    Solve(SolveArgs),
    /// Print the amortization schedule of a fully specified loan
    Schedule(ScheduleArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum Target {
    Capital,
    Duration,
    Repayment,
    Rate,
}

impl From<Target> for Field {
    fn from(target: Target) -> Self {
        match target {
            Target::Capital => Field::Capital,
            Target::Duration => Field::Duration,
            Target::Repayment => Field::Repayment,
            Target::Rate => Field::Rate,
        }
    }
}

#[derive(Args)]
struct LoanArgs {
    /// Amount borrowed
    #[arg(long, allow_negative_numbers = true)]
    capital: Option<f64>,

    /// Monthly repayment
    #[arg(long, allow_negative_numbers = true)]
    repayment: Option<f64>,

    /// Number of monthly periods
    #[arg(long, allow_negative_numbers = true)]
    duration: Option<f64>,

    /// Annual interest rate in percent, e.g. 7.42
    #[arg(long, allow_negative_numbers = true)]
    rate: Option<f64>,
}

impl LoanArgs {
    fn parameters(&self) -> LoanParameters {
        LoanParameters {
            capital: self.capital,
            repayment: self.repayment,
            duration: self.duration,
            annual_rate: self.rate.map(percent_to_rate),
        }
    }
}

#[derive(Args)]
struct SolverArgs {
    /// Convergence tolerance on the annual rate (as a fraction)
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Maximum Newton-Raphson iterations
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    /// Starting annual rate in percent
    #[arg(long, default_value_t = rate_to_percent(DEFAULT_INITIAL_GUESS))]
    initial_guess: f64,
}

impl SolverArgs {
    fn config(&self) -> SolverConfig {
        SolverConfig::new(self.tolerance, self.max_iterations)
            .with_initial_guess(percent_to_rate(self.initial_guess))
    }
}

#[derive(Args)]
struct SolveArgs {
    /// Quantity to compute
    target: Target,

    #[command(flatten)]
    loan: LoanArgs,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Args)]
struct ScheduleArgs {
    #[command(flatten)]
    loan: LoanArgs,

    /// Date of the first repayment (YYYY-MM-DD); adds a date column
    #[arg(long)]
    first_payment: Option<NaiveDate>,

    /// Print totals after the table
    #[arg(long)]
    summary: bool,
}

fn describe(solved: &Solved) -> String {
    match solved.field {
        Field::Capital | Field::Repayment => {
            format!("{}: {}", solved.field, format_amount(solved.value))
        }
        Field::Duration => format!("{}: {:.2} months", solved.field, solved.value),
        Field::Rate => format!(
            "{}: {}%",
            solved.field,
            round_to(rate_to_percent(solved.value), 4)
        ),
    }
}

fn run_solve(args: &SolveArgs) -> LoanResult<String> {
    let target = Field::from(args.target);
    let params = args.loan.parameters();

    // the target's entry is locked; anything typed there is ignored
    for field in Field::ALL {
        if !target.editable_fields().contains(&field) && params.get(field).is_some() {
            warn!("ignoring the supplied {} since it is being computed", field);
        }
    }

    let solved = params.solve(target, &args.solver.config())?;
    if !solved.converged {
        eprintln!(
            "warning: the rate did not converge after {} iterations; showing the last estimate",
            args.solver.max_iterations
        );
    }
    Ok(describe(&solved))
}

fn run_schedule(args: &ScheduleArgs) -> LoanResult<String> {
    let rows: Vec<_> = Schedule::from_parameters(&args.loan.parameters())?.collect();
    info!("schedule has {} rows", rows.len());

    let mut out = match args.first_payment {
        Some(first) => render_dated_report(rows.iter().copied(), first)?,
        None => render_report(rows.iter().copied()),
    };
    if args.summary {
        let summary: ScheduleSummary = rows.into_iter().collect();
        out.push('\n');
        out.push_str(&summary.to_string());
        out.push('\n');
    }
    Ok(out)
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = SimpleLogger::new().with_level(log_level(cli.verbose)).init() {
        eprintln!("warning: logging unavailable: {}", e);
    }

    let result = match &cli.command {
        Command::Solve(args) => run_solve(args),
        Command::Schedule(args) => {
            let result = run_schedule(args);
            if result.is_err() {
                println!("Invalid parameters: cannot generate the amortization schedule.");
            }
            result
        }
    };

    match result {
        Ok(output) => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

// verifies that types can implement the gated traits below
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}
