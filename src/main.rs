//! # sat-oracle
//!
//! `sat-oracle` is a command-line satisfiability solver for formulas in
//! Conjunctive Normal Form, read in the DIMACS format either from a file or
//! from text given on the command line.
//!
//! Two search drivers are available:
//! 1.  **DPLL (Davis-Putnam-Logemann-Loveland)**: chronological backtracking
//!     over an explicit stack of decisions.
//! 2.  **CDCL (Conflict-Driven Clause Learning)**: learns a 1UIP clause from
//!     every conflict and jumps back non-chronologically.
//!
//! Either one runs with naive occurrence-list propagation or two watched
//! literals, and with VSIDS, fixed-order or random-order branching.
//!
//! ## Usage
//!
//! ```sh
//! # Solve a DIMACS file with the default CDCL solver
//! sat-oracle problem.cnf
//!
//! # Solve with DPLL and occurrence lists, with debug logging
//! sat-oracle file --path problem.cnf --solver dpll --propagator occurrence-lists --debug
//!
//! # Solve a formula from text and print the model
//! sat-oracle text --input "1 2 0\n-1 0" --print-solution
//!
//! # Give up after ten thousand conflicts
//! sat-oracle problem.cnf --max-conflicts 10000
//!
//! # Generate completions for bash
//! sat-oracle completions bash
//! ```
//!
//! The verdict is printed as a DIMACS `s` line (`SATISFIABLE`, `UNSATISFIABLE`
//! or `UNKNOWN`), with the model on a `v` line when requested. The exit status
//! is 10 for satisfiable, 20 for unsatisfiable, 0 for unknown and 1 on error.
//! Logging goes to stderr through `env_logger`; `RUST_LOG` takes precedence
//! over `--debug`.

mod command_line;

use crate::command_line::cli::{
    read_file, read_text, solve_and_report, Cli, CliError, Commands,
};
use clap::{CommandFactory, Parser};
use env_logger::Env;
use log::error;
use std::process::ExitCode;

/// Global allocator using `tikv-jemallocator` for memory usage tracking.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Some(Commands::File { path, common }) => {
            let (cnf, parse_time) = read_file(&path)?;
            solve_and_report(&cnf, &common, Some(path.as_path()), parse_time)
        }
        Some(Commands::Text { input, common }) => {
            let (cnf, parse_time) = read_text(&input)?;
            solve_and_report(&cnf, &common, None, parse_time)
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let path = cli.path.ok_or(CliError::NoInput)?;
            let (cnf, parse_time) = read_file(&path)?;
            solve_and_report(&cnf, &cli.common, Some(path.as_path()), parse_time)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let debug = match &cli.command {
        Some(Commands::File { common, .. } | Commands::Text { common, .. }) => common.debug,
        _ => cli.common.debug,
    };
    init_logging(debug);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
