#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The mutable search context shared by the DPLL and CDCL drivers.
//!
//! A driver owns exactly one [`SearchContext`] and moves it forward with
//! [`SearchContext::decide`] and [`SearchContext::propagate`] and backward with
//! [`SearchContext::backtrack_to`]. Nothing is cloned per decision.

use crate::sat::assignment::Assignment;
use crate::sat::clause::{Clause, ClauseRef};
use crate::sat::cnf::Cnf;
use crate::sat::literal::Literal;
use crate::sat::phase_saving::SavedPhases;
use crate::sat::propagation::{ClauseStatus, Propagator};
use crate::sat::solver::{Limits, SearchState, SolutionStats, Solutions, SolverConfig};
use crate::sat::trail::{Reason, Trail};
use crate::sat::variable_selection::VariableSelection;
use log::debug;
use std::time::Instant;

#[derive(Debug)]
pub struct SearchContext<C: SolverConfig> {
    pub cnf: Cnf<C::Literal>,
    pub trail: Trail<C::Literal>,
    pub assignment: Assignment,
    pub propagator: C::Propagator,
    pub selector: C::VariableSelector,
    pub phases: SavedPhases,
    pub decision_level: usize,
    pub stats: SolutionStats,
    pub limits: Limits,
    pub state: SearchState,
    started: Option<Instant>,
}

impl<C: SolverConfig> SearchContext<C> {
    /// Sets up the root of the search. Unit clauses of the input are asserted at
    /// level 0; two contradicting units leave the context in a conflict.
    pub fn new(cnf: Cnf<C::Literal>) -> Self {
        let mut ctx = Self {
            trail: Trail::new(cnf.num_vars),
            assignment: Assignment::new(cnf.num_vars),
            propagator: C::Propagator::new(&cnf),
            selector: C::VariableSelector::new(&cnf),
            phases: SavedPhases::new(cnf.num_vars),
            decision_level: 0,
            stats: SolutionStats::default(),
            limits: Limits::unbounded(),
            state: SearchState::Propagating,
            started: None,
            cnf,
        };

        for c_ref in 0..ctx.cnf.len() {
            if !ctx.cnf[c_ref].is_unit() {
                continue;
            }

            let lit = ctx.cnf[c_ref][0];
            match ctx.assignment.literal_value(lit) {
                None => ctx.enqueue(lit, Reason::Clause(c_ref)),
                Some(true) => {}
                Some(false) => {
                    debug!("unit clause {c_ref} contradicts an earlier unit");
                    ctx.state = SearchState::Conflict(c_ref);
                    break;
                }
            }
        }

        ctx
    }

    /// Starts the clock for [`Limits::timeout`] if it is not running yet.
    pub fn start_clock(&mut self) {
        self.started.get_or_insert_with(Instant::now);
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
        self.started = None;
    }

    #[must_use]
    pub fn limits_exhausted(&self) -> bool {
        self.started
            .is_some_and(|started| self.limits.is_exhausted(&self.stats, started))
    }

    /// Runs the propagator to fixpoint and returns the falsified clause, if any.
    pub fn propagate(&mut self) -> Option<ClauseRef> {
        let before = self.trail.len();
        let conflict =
            self.propagator
                .propagate(&mut self.trail, &mut self.assignment, &mut self.cnf);
        self.stats.propagations += self.trail.len() - before;
        conflict
    }

    /// Opens a new decision level and assigns `lit` as its decision.
    pub fn decide(&mut self, lit: C::Literal) {
        self.decision_level += 1;
        self.stats.decisions += 1;
        self.stats.max_decision_level = self.stats.max_decision_level.max(self.decision_level);
        self.trail
            .push(&mut self.assignment, lit, self.decision_level, Reason::Decision);
    }

    /// Assigns `lit` at the current level.
    pub fn enqueue(&mut self, lit: C::Literal, reason: Reason) {
        self.trail
            .push(&mut self.assignment, lit, self.decision_level, reason);
    }

    /// Undoes every assignment above `level`. The selector and the saved phases
    /// see each unassigned variable.
    pub fn backtrack_to(&mut self, level: usize) {
        debug_assert!(level <= self.decision_level);

        self.propagator.backtrack(&self.trail, level);

        let selector = &mut self.selector;
        let phases = &mut self.phases;
        self.trail.backstep_to(&mut self.assignment, level, |step| {
            selector.on_unassign(step.lit.variable());
            phases.save(step.lit);
        });

        self.decision_level = level;
    }

    /// Adds a learned clause to the database and the propagator.
    pub fn learn(&mut self, clause: Clause<C::Literal>) -> ClauseRef {
        let c_ref = self.cnf.add_clause(clause);
        self.propagator.add_clause(&self.cnf, &self.trail, c_ref);
        self.stats.learnt_clauses += 1;
        c_ref
    }

    #[must_use]
    pub fn all_assigned(&self) -> bool {
        self.assignment.all_assigned()
    }

    #[must_use]
    pub fn clause_status(&self, c_ref: ClauseRef) -> ClauseStatus<C::Literal> {
        self.propagator
            .clause_status(&self.cnf, &self.assignment, c_ref)
    }

    /// An original clause every literal of which is false, if there is one.
    #[must_use]
    pub fn falsified_clause(&self) -> Option<ClauseRef> {
        (0..self.cnf.non_learnt_idx).find(|&c_ref| self.cnf[c_ref].is_falsified_by(&self.assignment))
    }

    /// Whether every original clause has a true literal.
    #[must_use]
    pub fn is_sat(&self) -> bool {
        self.cnf
            .originals()
            .all(|clause| clause.is_satisfied_by(&self.assignment))
    }

    #[must_use]
    pub fn solutions(&self) -> Solutions {
        self.assignment.get_solutions()
    }
}
