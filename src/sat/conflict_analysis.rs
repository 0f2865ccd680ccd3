#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! First-UIP conflict analysis.
//!
//! Starting from the falsified clause, the analysis resolves against the
//! antecedent of the most recently assigned literal of the conflict level until
//! a single literal of that level is left: the first unique implication point.
//! Literals fixed at level 0 are false for the rest of the search and are left
//! out of the learned clause.

use crate::sat::clause::{Clause, ClauseRef};
use crate::sat::cnf::Cnf;
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::Trail;
use bit_vec::BitVec;
use smallvec::{SmallVec, smallvec};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Conflict<L: Literal> {
    /// The conflict does not depend on any decision: the formula is unsatisfiable.
    Ground,
    /// A single-literal clause; backtrack to the root and assert it.
    Unit(L),
    /// A learned clause and the level to backtrack to. The asserting literal is
    /// at position 0, a literal of the backtrack level at position 1.
    Learned(Clause<L>, usize),
}

/// Reusable buffers for conflict analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Analyser {
    seen: BitVec,
    bumped: Vec<Variable>,
}

impl Analyser {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            seen: BitVec::from_elem(num_vars + 1, false),
            bumped: Vec::new(),
        }
    }

    /// Variables that took part in the last analysis.
    #[must_use]
    pub fn bumped(&self) -> &[Variable] {
        &self.bumped
    }

    /// Derives the 1UIP clause for the falsified clause `c_ref`.
    ///
    /// # Panics
    ///
    /// If a literal of the conflict level other than the UIP has no antecedent,
    /// which means the trail does not describe an implication graph.
    pub fn analyse<L: Literal>(
        &mut self,
        cnf: &Cnf<L>,
        trail: &Trail<L>,
        c_ref: ClauseRef,
    ) -> Conflict<L> {
        self.bumped.clear();

        let level = trail.decision_level();
        if level == 0 {
            return Conflict::Ground;
        }

        let mut learnt: SmallVec<[L; 8]> = smallvec![L::default()];
        let mut path_count = 0usize;
        let mut idx = trail.len();
        let mut clause = c_ref;
        let mut pivot: Option<L> = None;

        loop {
            for &lit in cnf[clause].iter() {
                let var = lit.variable();
                if pivot.is_some_and(|p| p.variable() == var)
                    || self.seen[var as usize]
                    || trail.level(var) == 0
                {
                    continue;
                }

                self.seen.set(var as usize, true);
                self.bumped.push(var);

                if trail.level(var) == level {
                    path_count += 1;
                } else {
                    learnt.push(lit);
                }
            }

            let next = loop {
                idx -= 1;
                let lit = trail[idx].lit;
                if self.seen[lit.variable() as usize] {
                    break lit;
                }
            };

            self.seen.set(next.variable() as usize, false);
            path_count -= 1;

            if path_count == 0 {
                learnt[0] = next.negated();
                break;
            }

            clause = trail
                .reason(next.variable())
                .antecedent()
                .unwrap_or_else(|| panic!("{next:?} at level {level} has no antecedent"));
            pivot = Some(next);
        }

        for lit in &learnt[1..] {
            self.seen.set(lit.variable() as usize, false);
        }

        if learnt.len() == 1 {
            return Conflict::Unit(learnt[0]);
        }

        let (second, backtrack_level) = learnt
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, lit)| (i, trail.level(lit.variable())))
            .max_by_key(|&(_, lvl)| lvl)
            .unwrap_or((1, 0));
        learnt.swap(1, second);

        Conflict::Learned(Clause::learnt(learnt), backtrack_level)
    }
}
