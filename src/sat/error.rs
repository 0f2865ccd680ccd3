#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Errors for malformed input. Satisfiable and unsatisfiable are verdicts, not
//! errors; everything here is a caller mistake detected before solving starts.

use thiserror::Error;

/// A decoded formula that cannot be turned into a clause database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("clause {clause} is empty")]
    EmptyClause { clause: usize },

    #[error("clause {clause} contains the literal 0")]
    ZeroLiteral { clause: usize },

    #[error("clause {clause} mentions variable {variable}, but the header declares {declared}")]
    VariableOutOfRange {
        clause: usize,
        variable: usize,
        declared: usize,
    },

    #[error("header declares {declared} clauses, found {found}")]
    ClauseCountMismatch { declared: usize, found: usize },
}

/// Failure to read DIMACS text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: cannot parse '{token}' as a literal")]
    InvalidLiteral { line: usize, token: String },

    #[error("line {line}: malformed problem line '{content}'")]
    MalformedHeader { line: usize, content: String },

    #[error("line {line}: duplicate problem line")]
    DuplicateHeader { line: usize },

    #[error("line {line}: problem line after clause data")]
    LateHeader { line: usize },

    #[error(transparent)]
    Formula(#[from] FormulaError),
}
