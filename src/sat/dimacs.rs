#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF file format.
//!
//! The format consists of:
//! - Comment lines starting with `c`.
//! - A problem line `p cnf <num_variables> <num_clauses>`. It is optional here;
//!   without it the counts are derived from the clauses.
//! - Clauses as whitespace-separated nonzero integers, each terminated by `0`.
//!   A clause may span several lines, and several clauses may share one. A last
//!   clause missing its `0` at the end of input is accepted.
//! - An optional `%` line ending the data, as found in some benchmark sets.
//!
//! Parsing only decodes the text into a [`Formula`]. Checking it against its
//! header happens in [`Cnf::try_from`], so that [`read_cnf`] reports every
//! problem through one [`ParseError`].

use crate::sat::cnf::{Cnf, Formula};
use crate::sat::error::ParseError;
use crate::sat::literal::Literal;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

/// Parses DIMACS text from `reader`.
///
/// # Errors
///
/// - [`ParseError::Io`] if a line cannot be read.
/// - [`ParseError::InvalidLiteral`] for a token that is not an `i32`.
/// - [`ParseError::MalformedHeader`], [`ParseError::DuplicateHeader`] or
///   [`ParseError::LateHeader`] for a bad problem line.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Formula, ParseError> {
    let mut header: Option<(usize, usize)> = None;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx + 1;
        let trimmed = line.trim();

        if trimmed.starts_with('%') {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }

        if trimmed.starts_with('p') {
            if header.is_some() {
                return Err(ParseError::DuplicateHeader { line: number });
            }
            if !clauses.is_empty() || !current.is_empty() {
                return Err(ParseError::LateHeader { line: number });
            }
            header = Some(parse_header(trimmed, number)?);
            continue;
        }

        for token in trimmed.split_whitespace() {
            let lit: i32 = token.parse().map_err(|_| ParseError::InvalidLiteral {
                line: number,
                token: token.to_string(),
            })?;

            if lit == 0 {
                clauses.push(std::mem::take(&mut current));
            } else {
                current.push(lit);
            }
        }
    }

    if !current.is_empty() {
        clauses.push(current);
    }

    Ok(match header {
        Some((num_vars, num_clauses)) => Formula {
            num_vars,
            num_clauses,
            clauses,
        },
        None => Formula::new(clauses),
    })
}

fn parse_header(line: &str, number: usize) -> Result<(usize, usize), ParseError> {
    let malformed = || ParseError::MalformedHeader {
        line: number,
        content: line.to_string(),
    };

    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["p", "cnf", vars, clauses] => {
            let vars = vars.parse().map_err(|_| malformed())?;
            let clauses = clauses.parse().map_err(|_| malformed())?;
            Ok((vars, clauses))
        }
        _ => Err(malformed()),
    }
}

/// Parses DIMACS text held in memory.
///
/// # Errors
///
/// As [`parse_dimacs`].
pub fn parse(text: &str) -> Result<Formula, ParseError> {
    parse_dimacs(Cursor::new(text))
}

/// Parses the DIMACS file at `path`.
///
/// # Errors
///
/// [`ParseError::Io`] if the file cannot be opened, otherwise as [`parse_dimacs`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Formula, ParseError> {
    let file = File::open(path)?;
    parse_dimacs(BufReader::new(file))
}

/// Parses and validates DIMACS text into a clause database.
///
/// # Errors
///
/// Any [`ParseError`], including [`ParseError::Formula`] when the clauses do not
/// match the problem line.
pub fn read_cnf<L: Literal, R: BufRead>(reader: R) -> Result<Cnf<L>, ParseError> {
    let formula = parse_dimacs(reader)?;
    Ok(Cnf::try_from(formula)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::error::FormulaError;
    use crate::sat::literal::PackedLiteral;

    #[test]
    fn test_parse_simple() {
        let formula = parse("c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n").unwrap();
        assert_eq!(formula.num_vars, 3);
        assert_eq!(formula.num_clauses, 2);
        assert_eq!(formula.clauses, vec![vec![1, -2], vec![2, 3]]);
    }

    #[test]
    fn test_clauses_span_lines() {
        let formula = parse("p cnf 4 3\n1 2\n-3 0 4 0\n\n-1\n0\n").unwrap();
        assert_eq!(formula.clauses, vec![vec![1, 2, -3], vec![4], vec![-1]]);
    }

    #[test]
    fn test_end_marker_and_missing_terminator() {
        let formula = parse("p cnf 2 2\n1 0\n-2\n%\n0\nc ignored\n").unwrap();
        assert_eq!(formula.clauses, vec![vec![1], vec![-2]]);
    }

    #[test]
    fn test_header_is_optional() {
        let formula = parse("1 -7 0\n2 0\n").unwrap();
        assert_eq!(formula.num_vars, 7);
        assert_eq!(formula.num_clauses, 2);
    }

    #[test]
    fn test_invalid_literal() {
        let err = parse("p cnf 2 1\n1 abc 0\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidLiteral { line: 2, ref token } if token == "abc"
        ));
    }

    #[test]
    fn test_bad_headers() {
        assert!(matches!(
            parse("p cnf x 1\n"),
            Err(ParseError::MalformedHeader { line: 1, .. })
        ));
        assert!(matches!(
            parse("p dnf 1 1\n"),
            Err(ParseError::MalformedHeader { .. })
        ));
        assert!(matches!(
            parse("p cnf 1 1\np cnf 1 1\n"),
            Err(ParseError::DuplicateHeader { line: 2 })
        ));
        assert!(matches!(
            parse("1 0\np cnf 1 1\n"),
            Err(ParseError::LateHeader { line: 2 })
        ));
    }

    #[test]
    fn test_read_cnf_validates() {
        let cnf: Cnf<PackedLiteral> = read_cnf(Cursor::new("p cnf 3 2\n1 -3 0\n2 0\n")).unwrap();
        assert_eq!(cnf.num_vars, 3);
        assert_eq!(cnf.len(), 2);

        let err = read_cnf::<PackedLiteral, _>(Cursor::new("p cnf 2 1\n1 0\n0\n")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Formula(FormulaError::ClauseCountMismatch {
                declared: 1,
                found: 2
            })
        ));

        let err = read_cnf::<PackedLiteral, _>(Cursor::new("p cnf 1 1\n0\n")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Formula(FormulaError::EmptyClause { clause: 0 })
        ));

        let err = read_cnf::<PackedLiteral, _>(Cursor::new("p cnf 2 1\n1 -3 0\n")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "clause 0 mentions variable 3, but the header declares 2"
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            parse_file("/definitely/not/here.cnf"),
            Err(ParseError::Io(_))
        ));
    }
}
