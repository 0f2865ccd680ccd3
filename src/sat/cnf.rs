#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The clause database.
//!
//! [`Formula`] is the decoded input: the header counts and the raw DIMACS clauses.
//! [`Cnf`] is the validated database the solvers work on. It owns the original
//! clauses followed by any clauses learned during search; a clause's index is its
//! stable [`ClauseRef`].

use crate::sat::clause::{Clause, ClauseRef};
use crate::sat::error::FormulaError;
use crate::sat::literal::{Literal, PackedLiteral, var_of};
use crate::sat::solver::Solutions;
use core::ops::{Index, IndexMut};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A CNF problem as it comes out of the parser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Formula {
    /// Declared number of variables.
    pub num_vars: usize,
    /// Declared number of clauses.
    pub num_clauses: usize,
    pub clauses: Vec<Vec<i32>>,
}

impl Formula {
    /// Builds a formula whose header is derived from the clauses themselves.
    #[must_use]
    pub fn new(clauses: Vec<Vec<i32>>) -> Self {
        let num_vars = clauses
            .iter()
            .flatten()
            .map(|&lit| var_of(lit) as usize)
            .max()
            .unwrap_or(0);

        Self {
            num_vars,
            num_clauses: clauses.len(),
            clauses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf<L: Literal = PackedLiteral> {
    pub clauses: Vec<Clause<L>>,
    /// Variables are `1..=num_vars`.
    pub num_vars: usize,
    /// Clauses before this index are original, the rest were learned.
    pub non_learnt_idx: usize,
}

impl<L: Literal> Cnf<L> {
    /// Builds a database straight from DIMACS clauses, sizing the variable range
    /// from the largest variable seen. Clauses are not validated; use
    /// [`Cnf::try_from`] on a [`Formula`] for untrusted input.
    pub fn new<I, C>(clauses: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = i32>,
    {
        let clauses = clauses
            .into_iter()
            .map(|c| c.into_iter().map(L::from_i32).collect::<Clause<L>>())
            .collect_vec();

        let num_vars = clauses
            .iter()
            .flat_map(Clause::iter)
            .map(|lit| lit.variable() as usize)
            .max()
            .unwrap_or(0);

        Self {
            non_learnt_idx: clauses.len(),
            clauses,
            num_vars,
        }
    }

    /// Appends a clause and returns its reference.
    pub fn add_clause(&mut self, clause: Clause<L>) -> ClauseRef {
        debug_assert!(!clause.is_empty(), "the database never stores an empty clause");
        debug_assert!(
            clause.iter().all(|l| (l.variable() as usize) <= self.num_vars),
            "clause mentions a variable outside 1..={}",
            self.num_vars
        );

        let c_ref = self.clauses.len();
        self.clauses.push(clause);
        c_ref
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause<L>> {
        self.clauses.iter()
    }

    /// The clauses of the input formula, without learned clauses.
    pub fn originals(&self) -> impl Iterator<Item = &Clause<L>> {
        self.clauses[..self.non_learnt_idx].iter()
    }

    #[must_use]
    pub fn num_learnt(&self) -> usize {
        self.clauses.len() - self.non_learnt_idx
    }

    /// Checks that every original clause has a literal made true by `solutions`.
    ///
    /// This is independent of any solver bookkeeping and is the authoritative
    /// test of a model.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.originals().all(|clause| {
            clause
                .iter()
                .any(|&lit| solutions.value(lit.variable()) == Some(lit.polarity()))
        })
    }
}

impl<L: Literal> TryFrom<Formula> for Cnf<L> {
    type Error = FormulaError;

    fn try_from(formula: Formula) -> Result<Self, Self::Error> {
        if formula.clauses.len() != formula.num_clauses {
            return Err(FormulaError::ClauseCountMismatch {
                declared: formula.num_clauses,
                found: formula.clauses.len(),
            });
        }

        for (index, clause) in formula.clauses.iter().enumerate() {
            if clause.is_empty() {
                return Err(FormulaError::EmptyClause { clause: index });
            }

            for &lit in clause {
                if lit == 0 {
                    return Err(FormulaError::ZeroLiteral { clause: index });
                }
                let var = var_of(lit) as usize;
                if var > formula.num_vars {
                    return Err(FormulaError::VariableOutOfRange {
                        clause: index,
                        variable: var,
                        declared: formula.num_vars,
                    });
                }
            }
        }

        let clauses = formula
            .clauses
            .iter()
            .map(|c| Clause::new(c))
            .collect_vec();

        Ok(Self {
            non_learnt_idx: clauses.len(),
            clauses,
            num_vars: formula.num_vars,
        })
    }
}

impl<L: Literal> Index<ClauseRef> for Cnf<L> {
    type Output = Clause<L>;

    fn index(&self, index: ClauseRef) -> &Self::Output {
        &self.clauses[index]
    }
}

impl<L: Literal> IndexMut<ClauseRef> for Cnf<L> {
    fn index_mut(&mut self, index: ClauseRef) -> &mut Self::Output {
        &mut self.clauses[index]
    }
}

impl<L: Literal> Display for Cnf<L> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.non_learnt_idx)?;
        for clause in self.originals() {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}
