#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Unit propagation.
//!
//! A [`Propagator`] consumes the unprocessed suffix of the trail (everything from
//! `trail.curr_idx` on) and pushes every literal forced by a unit clause, until
//! either nothing is left to process or some clause is falsified. It never makes
//! decisions and never backtracks on its own.
//!
//! Two strategies are provided:
//!
//! - [`OccurrenceLists`]: per-variable positive/negative occurrence lists with a
//!   true-literal counter and a not-yet-false counter per clause. Every
//!   assignment touches every clause the variable occurs in.
//! - [`WatchedLiterals`]: two watched literals per clause; an assignment only
//!   visits the clauses watching the literal it falsifies.
//!
//! For the same starting trail both reach the same set of forced literals, and
//! at fixpoint both report the same [`ClauseStatus`] for every clause.

use crate::sat::assignment::Assignment;
use crate::sat::clause::{Clause, ClauseRef};
use crate::sat::cnf::Cnf;
use crate::sat::literal::Literal;
use crate::sat::trail::{Reason, Trail};
use crate::sat::watch::Watches;
use clap::ValueEnum;
use std::fmt::{Debug, Display, Formatter};

/// Status of a clause under the current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseStatus<L: Literal> {
    /// Some literal is true.
    Satisfied,
    /// No literal is true and exactly this one is unassigned.
    Unit(L),
    /// No literal is true and at least two are unassigned.
    Unresolved,
    /// Every literal is false.
    Unsatisfied,
}

impl<L: Literal> ClauseStatus<L> {
    /// Classifies a clause by scanning all of its literals.
    #[must_use]
    pub fn evaluate(clause: &Clause<L>, assignment: &Assignment) -> Self {
        let mut unassigned = None;
        let mut count = 0;

        for &lit in clause.iter() {
            match assignment.literal_value(lit) {
                Some(true) => return Self::Satisfied,
                Some(false) => {}
                None => {
                    count += 1;
                    unassigned = Some(lit);
                }
            }
        }

        match (count, unassigned) {
            (0, _) => Self::Unsatisfied,
            (1, Some(lit)) => Self::Unit(lit),
            _ => Self::Unresolved,
        }
    }
}

pub trait Propagator<L: Literal>: Debug {
    fn new(cnf: &Cnf<L>) -> Self;

    /// Registers a clause appended to `cnf` after construction. Literals already
    /// processed on `trail` count as assigned for the new clause.
    fn add_clause(&mut self, cnf: &Cnf<L>, trail: &Trail<L>, c_ref: ClauseRef);

    /// Propagates to fixpoint. Returns the falsified clause on conflict, in
    /// which case later trail entries may remain unprocessed.
    fn propagate(
        &mut self,
        trail: &mut Trail<L>,
        assignment: &mut Assignment,
        cnf: &mut Cnf<L>,
    ) -> Option<ClauseRef>;

    /// Called before the trail is truncated to `level`.
    fn backtrack(&mut self, _trail: &Trail<L>, _level: usize) {}

    fn clause_status(
        &self,
        cnf: &Cnf<L>,
        assignment: &Assignment,
        c_ref: ClauseRef,
    ) -> ClauseStatus<L>;
}

/// Naive propagation over occurrence lists.
///
/// `true_count[c] > 0` marks clause `c` satisfied regardless of its other
/// literals; `remaining[c]` counts the literals of `c` not yet false. Both only
/// reflect trail entries before the propagation head, which keeps them exact to
/// undo on backtrack. `processed` is the number of entries they cover.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OccurrenceLists {
    positive: Vec<Vec<ClauseRef>>,
    negative: Vec<Vec<ClauseRef>>,
    true_count: Vec<usize>,
    remaining: Vec<usize>,
    processed: usize,
}

impl OccurrenceLists {
    fn occurs<L: Literal>(&mut self, lit: L, c_ref: ClauseRef) {
        let var = lit.variable() as usize;
        if lit.polarity() {
            self.positive[var].push(c_ref);
        } else {
            self.negative[var].push(c_ref);
        }
    }
}

impl<L: Literal> Propagator<L> for OccurrenceLists {
    fn new(cnf: &Cnf<L>) -> Self {
        let mut lists = Self {
            positive: vec![Vec::new(); cnf.num_vars + 1],
            negative: vec![Vec::new(); cnf.num_vars + 1],
            true_count: Vec::with_capacity(cnf.len()),
            remaining: Vec::with_capacity(cnf.len()),
            processed: 0,
        };

        for (c_ref, clause) in cnf.iter().enumerate() {
            for &lit in clause.iter() {
                lists.occurs(lit, c_ref);
            }
            lists.true_count.push(0);
            lists.remaining.push(clause.len());
        }

        lists
    }

    fn add_clause(&mut self, cnf: &Cnf<L>, trail: &Trail<L>, c_ref: ClauseRef) {
        debug_assert_eq!(c_ref, self.remaining.len());

        let mut true_count = 0;
        let mut remaining = 0;
        for &lit in cnf[c_ref].iter() {
            self.occurs(lit, c_ref);
            let processed = trail
                .position(lit.variable())
                .filter(|&pos| pos < trail.curr_idx)
                .map(|pos| trail[pos].lit);
            match processed {
                Some(assigned) if assigned == lit => {
                    true_count += 1;
                    remaining += 1;
                }
                Some(_) => {}
                None => remaining += 1,
            }
        }

        self.true_count.push(true_count);
        self.remaining.push(remaining);
    }

    fn propagate(
        &mut self,
        trail: &mut Trail<L>,
        assignment: &mut Assignment,
        cnf: &mut Cnf<L>,
    ) -> Option<ClauseRef> {
        while trail.curr_idx < trail.len() {
            let lit = trail[trail.curr_idx].lit;
            trail.curr_idx += 1;

            let level = trail.decision_level();
            let var = lit.variable() as usize;
            let (satisfied, falsified) = if lit.polarity() {
                (&self.positive[var], &self.negative[var])
            } else {
                (&self.negative[var], &self.positive[var])
            };

            for &c_ref in satisfied {
                self.true_count[c_ref] += 1;
            }

            // Every counter must see this literal before returning, so a
            // conflict is only recorded here.
            let mut conflict = None;
            for &c_ref in falsified {
                self.remaining[c_ref] -= 1;
                if conflict.is_some() || self.true_count[c_ref] > 0 {
                    continue;
                }

                match self.remaining[c_ref] {
                    0 => conflict = Some(c_ref),
                    1 => {
                        let open = cnf[c_ref]
                            .iter()
                            .copied()
                            .find(|&l| assignment.literal_value(l) != Some(false));
                        match open {
                            Some(forced) if assignment.literal_value(forced).is_none() => {
                                trail.push(assignment, forced, level, Reason::Clause(c_ref));
                            }
                            // True but not yet processed.
                            Some(_) => {}
                            None => conflict = Some(c_ref),
                        }
                    }
                    _ => {}
                }
            }

            if conflict.is_some() {
                self.processed = trail.curr_idx;
                return conflict;
            }
        }

        self.processed = trail.curr_idx;
        None
    }

    fn backtrack(&mut self, trail: &Trail<L>, level: usize) {
        let undone = trail
            .iter()
            .take(trail.curr_idx)
            .rev()
            .take_while(|step| step.decision_level > level);

        let mut count = 0;
        for step in undone {
            count += 1;
            let var = step.lit.variable() as usize;
            let (satisfied, falsified) = if step.lit.polarity() {
                (&self.positive[var], &self.negative[var])
            } else {
                (&self.negative[var], &self.positive[var])
            };
            for &c_ref in satisfied {
                self.true_count[c_ref] -= 1;
            }
            for &c_ref in falsified {
                self.remaining[c_ref] += 1;
            }
        }
        self.processed = trail.curr_idx - count;
    }

    fn clause_status(
        &self,
        cnf: &Cnf<L>,
        assignment: &Assignment,
        c_ref: ClauseRef,
    ) -> ClauseStatus<L> {
        if self.true_count[c_ref] > 0 {
            return ClauseStatus::Satisfied;
        }

        // Assignments past the propagation head are not counted yet.
        if assignment.num_assigned() != self.processed {
            return ClauseStatus::evaluate(&cnf[c_ref], assignment);
        }

        match self.remaining[c_ref] {
            0 => {
                debug_assert!(cnf[c_ref].is_falsified_by(assignment));
                ClauseStatus::Unsatisfied
            }
            1 => cnf[c_ref]
                .iter()
                .copied()
                .find(|&l| assignment.literal_value(l).is_none())
                .map_or_else(
                    || ClauseStatus::evaluate(&cnf[c_ref], assignment),
                    ClauseStatus::Unit,
                ),
            _ => ClauseStatus::Unresolved,
        }
    }
}

/// Two-watched-literal propagation.
///
/// For every clause of length two or more, positions 0 and 1 are watched. While
/// the clause is neither unit nor falsified, both watches are non-false once
/// propagation reaches fixpoint. Unit clauses of the input are not watched; the
/// search context asserts them at level 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchedLiterals {
    watches: Watches,
}

impl WatchedLiterals {
    fn watch_clause<L: Literal>(&mut self, clause: &Clause<L>, c_ref: ClauseRef) {
        if clause.len() < 2 {
            return;
        }
        debug_assert_ne!(clause[0], clause[1]);
        self.watches.watch(clause[0], c_ref);
        self.watches.watch(clause[1], c_ref);
    }

    /// Visits the clauses watching `false_lit`, which has just become false.
    fn propagate_false<L: Literal>(
        &mut self,
        false_lit: L,
        trail: &mut Trail<L>,
        assignment: &mut Assignment,
        cnf: &mut Cnf<L>,
    ) -> Option<ClauseRef> {
        let level = trail.decision_level();
        let mut watchers = self.watches.take(false_lit);
        let mut conflict = None;
        let mut i = 0;

        while i < watchers.len() {
            let c_ref = watchers[i];
            let clause = &mut cnf[c_ref];

            if clause[0] == false_lit {
                clause.swap(0, 1);
            }
            debug_assert_eq!(clause[1], false_lit, "clause {c_ref} is not watching {false_lit:?}");

            let other = clause[0];
            let other_value = assignment.literal_value(other);
            if other_value == Some(true) {
                i += 1;
                continue;
            }

            let replacement = (2..clause.len())
                .find(|&k| assignment.literal_value(clause[k]) != Some(false));
            if let Some(k) = replacement {
                clause.swap(1, k);
                self.watches.watch(clause[1], c_ref);
                watchers.swap_remove(i);
                continue;
            }

            match other_value {
                None => {
                    trail.push(assignment, other, level, Reason::Clause(c_ref));
                    i += 1;
                }
                Some(false) => {
                    conflict = Some(c_ref);
                    break;
                }
                Some(true) => unreachable!(),
            }
        }

        self.watches.restore(false_lit, watchers);
        conflict
    }
}

impl<L: Literal> Propagator<L> for WatchedLiterals {
    fn new(cnf: &Cnf<L>) -> Self {
        let mut wl = Self {
            watches: Watches::new(cnf.num_vars),
        };
        for (c_ref, clause) in cnf.iter().enumerate() {
            wl.watch_clause(clause, c_ref);
        }
        wl
    }

    fn add_clause(&mut self, cnf: &Cnf<L>, _trail: &Trail<L>, c_ref: ClauseRef) {
        self.watch_clause(&cnf[c_ref], c_ref);
    }

    fn propagate(
        &mut self,
        trail: &mut Trail<L>,
        assignment: &mut Assignment,
        cnf: &mut Cnf<L>,
    ) -> Option<ClauseRef> {
        while trail.curr_idx < trail.len() {
            let lit = trail[trail.curr_idx].lit;
            trail.curr_idx += 1;

            if let Some(c_ref) = self.propagate_false(lit.negated(), trail, assignment, cnf) {
                return Some(c_ref);
            }
        }

        None
    }

    fn clause_status(
        &self,
        cnf: &Cnf<L>,
        assignment: &Assignment,
        c_ref: ClauseRef,
    ) -> ClauseStatus<L> {
        let clause = &cnf[c_ref];
        if clause.len() >= 2
            && (assignment.literal_value(clause[0]) == Some(true)
                || assignment.literal_value(clause[1]) == Some(true))
        {
            return ClauseStatus::Satisfied;
        }

        ClauseStatus::evaluate(clause, assignment)
    }
}

/// Run-time choice of propagation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum PropagatorType {
    #[default]
    WatchedLiterals,
    OccurrenceLists,
}

impl Display for PropagatorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WatchedLiterals => write!(f, "watched-literals"),
            Self::OccurrenceLists => write!(f, "occurrence-lists"),
        }
    }
}
