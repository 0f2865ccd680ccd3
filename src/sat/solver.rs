#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solver interface shared by the search drivers.
//!
//! A solver is generic over a [`SolverConfig`], which fixes the literal
//! encoding, the propagation engine and the branching heuristic at compile time.
//! [`DefaultConfig`] is the fast combination used by CDCL; [`NaiveConfig`] is
//! the plain combination DPLL defaults to. [`Config`] builds any other one.

use crate::sat::literal::{Literal, NegativeLiteral, PackedLiteral, Variable, polarity, var_of};
use crate::sat::propagation::{OccurrenceLists, Propagator, WatchedLiterals};
use crate::sat::clause::ClauseRef;
use crate::sat::cnf::Cnf;
use crate::sat::variable_selection::{FixedOrder, VariableSelection, Vsids};
use clap::ValueEnum;
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;
use std::time::{Duration, Instant};

pub trait SolverConfig: Debug {
    type Literal: Literal;
    type Propagator: Propagator<Self::Literal>;
    type VariableSelector: VariableSelection;
}

/// Packed literals, two watched literals and VSIDS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefaultConfig;

impl SolverConfig for DefaultConfig {
    type Literal = PackedLiteral;
    type Propagator = WatchedLiterals;
    type VariableSelector = Vsids;
}

/// Signed literals, occurrence lists and the first unassigned variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NaiveConfig;

impl SolverConfig for NaiveConfig {
    type Literal = NegativeLiteral;
    type Propagator = OccurrenceLists;
    type VariableSelector = FixedOrder;
}

/// Any other combination of literal encoding, propagator and selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config<L, P, V>(PhantomData<(L, P, V)>);

impl<L, P, V> SolverConfig for Config<L, P, V>
where
    L: Literal,
    P: Propagator<L>,
    V: VariableSelection,
{
    type Literal = L;
    type Propagator = P;
    type VariableSelector = V;
}

/// A total model: the value of every variable `1..=n`, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Solutions(Vec<bool>);

impl Solutions {
    pub fn new(values: impl IntoIterator<Item = bool>) -> Self {
        Self(values.into_iter().collect())
    }

    /// Builds a model from DIMACS literals. Variables that are not mentioned,
    /// up to the largest one that is, are false. `0` is not a literal and is
    /// skipped.
    pub fn from_literals(literals: impl IntoIterator<Item = i32>) -> Self {
        let literals = literals.into_iter().filter(|&l| l != 0).collect_vec();
        let n = literals.iter().map(|&l| var_of(l) as usize).max().unwrap_or(0);

        let mut values = vec![false; n];
        for &lit in &literals {
            values[var_of(lit) as usize - 1] = polarity(lit);
        }
        Self(values)
    }

    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        (var as usize).checked_sub(1).and_then(|i| self.0.get(i).copied())
    }

    /// Whether the DIMACS literal `lit` is true in this model.
    #[must_use]
    pub fn check(&self, lit: i32) -> bool {
        self.value(var_of(lit)) == Some(polarity(lit))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The model as signed DIMACS literals in ascending variable order.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().enumerate().map(|(i, &value)| {
            let var = (i + 1) as i32;
            if value { var } else { -var }
        })
    }
}

impl Display for Solutions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iter().join(" "))
    }
}

/// Outcome of a call to [`Solver::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verdict {
    Sat(Solutions),
    Unsat,
    /// A [`Limits`] budget ran out before the search finished.
    Interrupted,
}

impl Verdict {
    #[must_use]
    pub const fn is_sat(&self) -> bool {
        matches!(self, Self::Sat(_))
    }

    #[must_use]
    pub const fn is_unsat(&self) -> bool {
        matches!(self, Self::Unsat)
    }

    #[must_use]
    pub const fn model(&self) -> Option<&Solutions> {
        match self {
            Self::Sat(solutions) => Some(solutions),
            _ => None,
        }
    }
}

/// The DIMACS `s` line, followed by the `v` line for a model.
impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sat(solutions) if solutions.is_empty() => write!(f, "s SATISFIABLE\nv 0"),
            Self::Sat(solutions) => write!(f, "s SATISFIABLE\nv {solutions} 0"),
            Self::Unsat => write!(f, "s UNSATISFIABLE"),
            Self::Interrupted => write!(f, "s UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SolutionStats {
    pub conflicts: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub learnt_clauses: usize,
    pub max_decision_level: usize,
}

/// Budgets for a single search. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Limits {
    pub max_decisions: Option<usize>,
    pub max_conflicts: Option<usize>,
    pub timeout: Option<Duration>,
}

impl Limits {
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_decisions: None,
            max_conflicts: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn is_exhausted(&self, stats: &SolutionStats, started: Instant) -> bool {
        self.max_decisions.is_some_and(|max| stats.decisions >= max)
            || self.max_conflicts.is_some_and(|max| stats.conflicts >= max)
            || self.timeout.is_some_and(|t| started.elapsed() >= t)
    }
}

/// Where the search driver currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SearchState {
    #[default]
    Propagating,
    Deciding,
    /// The clause is falsified by the current assignment.
    Conflict(ClauseRef),
    Sat,
    Unsat,
}

impl SearchState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sat | Self::Unsat)
    }
}

pub trait Solver<C: SolverConfig = DefaultConfig> {
    fn new(cnf: Cnf<C::Literal>) -> Self;

    /// Runs the search until a verdict is reached or a limit runs out. After
    /// [`Verdict::Interrupted`] the search can be resumed by calling `solve`
    /// again, usually after [`Solver::set_limits`]. Once a verdict is reached,
    /// further calls return it again.
    fn solve(&mut self) -> Verdict;

    /// The current assignment, unassigned variables reported false.
    fn solutions(&self) -> Solutions;

    fn stats(&self) -> SolutionStats;

    /// Replaces the limits and restarts the clock for the timeout.
    fn set_limits(&mut self, limits: Limits);

    fn state(&self) -> SearchState;
}

/// Run-time choice of search driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum SolverType {
    #[default]
    Cdcl,
    Dpll,
}

impl Display for SolverType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cdcl => write!(f, "cdcl"),
            Self::Dpll => write!(f, "dpll"),
        }
    }
}
