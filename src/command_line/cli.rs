#![allow(clippy::cast_precision_loss)]

use clap::{ArgAction, Args, Parser, Subcommand};
use log::{debug, info};
use sat_oracle::sat::cdcl::Cdcl;
use sat_oracle::sat::cnf::Cnf;
use sat_oracle::sat::dimacs::{parse, parse_file};
use sat_oracle::sat::dpll::Dpll;
use sat_oracle::sat::error::ParseError;
use sat_oracle::sat::literal::PackedLiteral;
use sat_oracle::sat::propagation::{OccurrenceLists, PropagatorType, WatchedLiterals};
use sat_oracle::sat::solver::{
    Config, Limits, SolutionStats, Solver, SolverConfig, SolverType, Verdict,
};
use sat_oracle::sat::variable_selection::{
    FixedOrder, RandomOrder, VariableSelectionType, Vsids,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use thiserror::Error;
use tikv_jemalloc_ctl::{epoch, stats};

/// Defines the command-line interface for the solver.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(name = "sat-oracle", version, about = "A CNF satisfiability solver")]
pub(crate) struct Cli {
    /// Path to a DIMACS .cnf file, solved when no subcommand is given.
    pub path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `file`, `text`).
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula provided as DIMACS text.
    Text {
        /// DIMACS input as a string (e.g. "1 -2 0\n2 3 0").
        /// Literals are space-separated and 0 terminates a clause. A literal `\n`
        /// in the string is read as a line break.
        #[arg(short, long)]
        input: String,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug logging. `RUST_LOG` overrides it.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check a found model against the original clauses.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) verify: bool,

    /// Print problem and search statistics after solving.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the `v` line with the model if the formula is satisfiable.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Search driver: "cdcl" (clause learning, backjumping) or "dpll"
    /// (chronological backtracking).
    #[arg(long, default_value_t = SolverType::Cdcl)]
    pub(crate) solver: SolverType,

    /// Unit propagation strategy.
    #[arg(long, default_value_t = PropagatorType::WatchedLiterals)]
    pub(crate) propagator: PropagatorType,

    /// Branching heuristic.
    #[arg(long, default_value_t = VariableSelectionType::Vsids)]
    pub(crate) variable_selection: VariableSelectionType,

    /// Stop with UNKNOWN after this many decisions.
    #[arg(long)]
    pub(crate) max_decisions: Option<usize>,

    /// Stop with UNKNOWN after this many conflicts.
    #[arg(long)]
    pub(crate) max_conflicts: Option<usize>,

    /// Stop with UNKNOWN after this many seconds.
    #[arg(long)]
    pub(crate) timeout: Option<f64>,
}

impl CommonOptions {
    pub(crate) fn limits(&self) -> Limits {
        Limits {
            max_decisions: self.max_decisions,
            max_conflicts: self.max_conflicts,
            timeout: self
                .timeout
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("model does not satisfy clause {clause}")]
    Verification { clause: usize },

    #[error("no input given, pass a DIMACS file or see --help")]
    NoInput,
}

/// Reads and validates a DIMACS file.
///
/// # Errors
///
/// Any [`ParseError`] from reading, decoding or validating the file.
pub(crate) fn read_file(path: &Path) -> Result<(Cnf, Duration), CliError> {
    let time = Instant::now();
    let cnf = Cnf::try_from(parse_file(path)?).map_err(ParseError::from)?;
    Ok((cnf, time.elapsed()))
}

/// Reads and validates DIMACS text given on the command line.
///
/// # Errors
///
/// Any [`ParseError`] from decoding or validating the text.
pub(crate) fn read_text(input: &str) -> Result<(Cnf, Duration), CliError> {
    let time = Instant::now();
    let text = input.replace("\\n", "\n");
    let cnf = Cnf::try_from(parse(&text)?).map_err(ParseError::from)?;
    Ok((cnf, time.elapsed()))
}

fn run<C, S>(cnf: &Cnf, limits: Limits) -> (Verdict, Duration, SolutionStats)
where
    C: SolverConfig<Literal = PackedLiteral>,
    S: Solver<C>,
{
    let time = Instant::now();
    let mut solver = S::new(cnf.clone());
    solver.set_limits(limits);
    let verdict = solver.solve();
    (verdict, time.elapsed(), solver.stats())
}

macro_rules! run_with {
    ($solver:ident, $propagator:ty, $selector:ty, $cnf:expr, $limits:expr) => {
        run::<
            Config<PackedLiteral, $propagator, $selector>,
            $solver<Config<PackedLiteral, $propagator, $selector>>,
        >($cnf, $limits)
    };
}

macro_rules! dispatch {
    ($solver:ident, $common:expr, $cnf:expr) => {{
        let limits = $common.limits();
        match ($common.propagator, $common.variable_selection) {
            (PropagatorType::WatchedLiterals, VariableSelectionType::Vsids) => {
                run_with!($solver, WatchedLiterals, Vsids, $cnf, limits)
            }
            (PropagatorType::WatchedLiterals, VariableSelectionType::FixedOrder) => {
                run_with!($solver, WatchedLiterals, FixedOrder, $cnf, limits)
            }
            (PropagatorType::WatchedLiterals, VariableSelectionType::RandomOrder) => {
                run_with!($solver, WatchedLiterals, RandomOrder, $cnf, limits)
            }
            (PropagatorType::OccurrenceLists, VariableSelectionType::Vsids) => {
                run_with!($solver, OccurrenceLists, Vsids, $cnf, limits)
            }
            (PropagatorType::OccurrenceLists, VariableSelectionType::FixedOrder) => {
                run_with!($solver, OccurrenceLists, FixedOrder, $cnf, limits)
            }
            (PropagatorType::OccurrenceLists, VariableSelectionType::RandomOrder) => {
                run_with!($solver, OccurrenceLists, RandomOrder, $cnf, limits)
            }
        }
    }};
}

/// Solves a CNF formula with the driver and strategies selected in `common`.
///
/// # Returns
/// A tuple containing:
/// * `Verdict`: SAT with a model, UNSAT, or UNKNOWN if a limit ran out.
/// * `Duration`: The time taken to solve the formula.
/// * `SolutionStats`: Statistics collected during the solving process.
pub(crate) fn solve(
    cnf: &Cnf,
    label: Option<&Path>,
    common: &CommonOptions,
) -> (Verdict, Duration, SolutionStats) {
    if let Some(name) = label {
        info!("solving {}", name.display());
    }
    debug!(
        "{} variables, {} clauses, solver {}, propagator {}, selection {}",
        cnf.num_vars,
        cnf.len(),
        common.solver,
        common.propagator,
        common.variable_selection
    );

    let (verdict, elapsed, stats) = match common.solver {
        SolverType::Cdcl => dispatch!(Cdcl, common, cnf),
        SolverType::Dpll => dispatch!(Dpll, common, cnf),
    };

    debug!("verdict after {elapsed:?}: {stats:?}");
    (verdict, elapsed, stats)
}

/// Checks a model against every original clause.
///
/// # Errors
///
/// [`CliError::Verification`] naming the first clause the model falsifies.
pub(crate) fn verify_solution(cnf: &Cnf, verdict: &Verdict) -> Result<(), CliError> {
    let Some(model) = verdict.model() else {
        return Ok(());
    };

    match cnf
        .originals()
        .position(|clause| !clause.to_i32s().any(|lit| model.check(lit)))
    {
        Some(clause) => Err(CliError::Verification { clause }),
        None => {
            info!("model verified");
            Ok(())
        }
    }
}

/// Solves a parsed formula and reports the verdict, statistics and verification.
///
/// # Errors
///
/// [`CliError::Verification`] if `--verify` is on and the model is wrong.
pub(crate) fn solve_and_report(
    cnf: &Cnf,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<ExitCode, CliError> {
    let (verdict, elapsed, solver_stats) = solve(cnf, label, common);

    if common.verify {
        verify_solution(cnf, &verdict)?;
    }

    if common.stats {
        let (allocated, resident) = memory_usage();
        print_stats(parse_time, elapsed, cnf, &solver_stats, allocated, resident);
    }

    match &verdict {
        Verdict::Sat(_) if common.print_solution => println!("{verdict}"),
        Verdict::Sat(_) => println!("s SATISFIABLE"),
        _ => println!("{verdict}"),
    }

    Ok(exit_code(&verdict))
}

/// Conventional exit status of SAT solvers: 10 satisfiable, 20 unsatisfiable,
/// 0 when the answer is unknown.
pub(crate) fn exit_code(verdict: &Verdict) -> ExitCode {
    match verdict {
        Verdict::Sat(_) => ExitCode::from(10),
        Verdict::Unsat => ExitCode::from(20),
        Verdict::Interrupted => ExitCode::SUCCESS,
    }
}

/// Allocated and resident memory in MiB, as reported by jemalloc.
fn memory_usage() -> (f64, f64) {
    let _ = epoch::advance();
    let allocated = stats::allocated::read().unwrap_or(0);
    let resident = stats::resident::read().unwrap_or(0);
    (
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    )
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("c |  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("c |  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics as DIMACS comment lines.
///
/// # Arguments
/// * `parse_time` - Duration spent parsing the input.
/// * `elapsed` - Duration spent by the solver.
/// * `cnf` - The CNF formula.
/// * `s` - `SolutionStats` collected by the solver.
/// * `allocated` - Allocated memory in MiB.
/// * `resident` - Resident memory in MiB.
pub(crate) fn print_stats(
    parse_time: Duration,
    elapsed: Duration,
    cnf: &Cnf,
    s: &SolutionStats,
    allocated: f64,
    resident: f64,
) {
    let elapsed_secs = elapsed.as_secs_f64();

    println!("c =====================[ Problem Statistics ]======================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars);
    stat_line("Clauses", cnf.non_learnt_idx);
    stat_line(
        "Literals",
        cnf.originals().map(|c| c.len()).sum::<usize>(),
    );

    println!("c ======================[ Search Statistics ]=======================");
    stat_line("Learnt clauses", s.learnt_clauses);
    stat_line("Max decision level", s.max_decision_level);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("c ==================================================================");
}
