#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Defines the DPLL (Davis-Putnam-Logemann-Loveland) SAT solver.
//!
//! The solver alternates three steps:
//! 1.  **Unit Propagation:** every clause with a single unassigned literal and
//!     no true literal forces that literal, until nothing more is forced or a
//!     clause is falsified.
//! 2.  **Decision:** if the formula is neither satisfied nor falsified, an
//!     unassigned variable is chosen and assigned `true`.
//! 3.  **Backtracking:** on a falsified clause the most recent decision that
//!     has not been flipped yet is undone, together with everything propagated
//!     after it, and retried as `false`. With no such decision left the formula
//!     is unsatisfiable.
//!
//! Branches are kept on an explicit stack of decision frames, one per decision
//! level, so deep searches never grow the call stack.

use crate::sat::cnf::Cnf;
use crate::sat::literal::Literal;
use crate::sat::solver::{
    Limits, NaiveConfig, SearchState, SolutionStats, Solutions, Solver, SolverConfig, Verdict,
};
use crate::sat::state::SearchContext;
use crate::sat::variable_selection::VariableSelection;
use log::{debug, info};

/// One open decision: the literal tried at its level and whether it is the
/// second branch already.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame<L: Literal> {
    lit: L,
    flipped: bool,
}

/// Represents a DPLL SAT solver.
///
/// Generic over `Config`, which fixes the literal encoding, the propagation
/// engine and the variable selector. Defaults to [`NaiveConfig`]: occurrence
/// lists and the lowest unassigned variable first.
#[derive(Debug)]
pub struct Dpll<Config: SolverConfig = NaiveConfig> {
    /// Trail, assignment, clause database and strategies.
    pub ctx: SearchContext<Config>,
    frames: Vec<Frame<Config::Literal>>,
}

impl<Config: SolverConfig> Solver<Config> for Dpll<Config> {
    /// Creates a new DPLL solver for the given formula, at level 0 with every
    /// variable unassigned.
    fn new(cnf: Cnf<Config::Literal>) -> Self {
        Self {
            ctx: SearchContext::new(cnf),
            frames: Vec::new(),
        }
    }

    /// Drives the search state machine until a verdict is reached.
    ///
    /// # Returns
    ///
    /// * `Verdict::Sat(model)` with a total model satisfying every clause.
    /// * `Verdict::Unsat` once both branches of every decision failed.
    /// * `Verdict::Interrupted` if a limit ran out; calling `solve` again
    ///   continues from the same point.
    fn solve(&mut self) -> Verdict {
        self.ctx.start_clock();
        info!(
            "dpll: {} variables, {} clauses",
            self.ctx.cnf.num_vars,
            self.ctx.cnf.len()
        );

        loop {
            match self.ctx.state {
                SearchState::Propagating => {
                    let conflict = self
                        .ctx
                        .propagate()
                        .or_else(|| self.ctx.falsified_clause());

                    self.ctx.state = match conflict {
                        Some(c_ref) => SearchState::Conflict(c_ref),
                        None if self.ctx.all_assigned() => SearchState::Sat,
                        None => SearchState::Deciding,
                    };
                }
                SearchState::Deciding => {
                    if self.ctx.limits_exhausted() {
                        debug!("dpll: limits reached after {:?}", self.ctx.stats);
                        return Verdict::Interrupted;
                    }
                    self.decide();
                }
                SearchState::Conflict(c_ref) => {
                    self.ctx.stats.conflicts += 1;
                    self.ctx.state = if self.ctx.decision_level == 0 {
                        SearchState::Unsat
                    } else {
                        debug!(
                            "dpll: clause {c_ref} falsified at level {}",
                            self.ctx.decision_level
                        );
                        self.flip()
                    };
                }
                SearchState::Sat => {
                    let solutions = self.solutions();
                    debug_assert!(self.ctx.is_sat(), "model falsifies a clause");
                    info!("dpll: satisfiable, {:?}", self.ctx.stats);
                    return Verdict::Sat(solutions);
                }
                SearchState::Unsat => {
                    info!("dpll: unsatisfiable, {:?}", self.ctx.stats);
                    return Verdict::Unsat;
                }
            }
        }
    }

    fn solutions(&self) -> Solutions {
        self.ctx.solutions()
    }

    fn stats(&self) -> SolutionStats {
        self.ctx.stats
    }

    fn set_limits(&mut self, limits: Limits) {
        self.ctx.set_limits(limits);
    }

    fn state(&self) -> SearchState {
        self.ctx.state
    }
}

impl<Config: SolverConfig> Dpll<Config> {
    /// Opens a new level with the selected variable set to `true`.
    ///
    /// # Panics
    ///
    /// If the selector returns no variable while some are unassigned.
    fn decide(&mut self) {
        let var = self
            .ctx
            .selector
            .pick(&self.ctx.assignment)
            .unwrap_or_else(|| panic!("no variable to decide on with unassigned variables left"));

        let lit = Config::Literal::new(var, true);
        self.frames.push(Frame {
            lit,
            flipped: false,
        });
        self.ctx.decide(lit);
        self.ctx.state = SearchState::Propagating;
    }

    /// Undoes decisions newest first until one can be retried with the opposite
    /// value. Returns the next state: `Propagating` after a flip, `Unsat` when
    /// every decision has had both branches.
    fn flip(&mut self) -> SearchState {
        while let Some(frame) = self.frames.pop() {
            self.ctx.backtrack_to(self.ctx.decision_level - 1);

            if !frame.flipped {
                let lit = frame.lit.negated();
                self.frames.push(Frame { lit, flipped: true });
                self.ctx.decide(lit);
                return SearchState::Propagating;
            }
        }

        SearchState::Unsat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::solver::DefaultConfig;

    fn solve(clauses: Vec<Vec<i32>>) -> (Verdict, Cnf<<NaiveConfig as SolverConfig>::Literal>) {
        let cnf = Cnf::new(clauses);
        let mut solver: Dpll = Dpll::new(cnf.clone());
        (solver.solve(), cnf)
    }

    #[test]
    fn test_contradicting_units() {
        let (verdict, _) = solve(vec![vec![1], vec![-1]]);
        assert_eq!(verdict, Verdict::Unsat);
    }

    #[test]
    fn test_single_clause() {
        let (verdict, cnf) = solve(vec![vec![1, -2, 3]]);
        let model = verdict.model().expect("satisfiable");
        assert!(cnf.verify(model));
        assert_eq!(model.to_string(), "1 2 3");
    }

    #[test]
    fn test_scenario() {
        let (verdict, cnf) = solve(vec![vec![1, -5, 4], vec![-1, 5, 3, 4], vec![-3, -4]]);
        assert!(cnf.verify(verdict.model().expect("satisfiable")));
    }

    #[test]
    fn test_needs_both_branches() {
        // Every assignment with 1 = true fails.
        let (verdict, cnf) = solve(vec![vec![-1, 2], vec![-1, -2], vec![1, 3], vec![-3, 4]]);
        let model = verdict.model().expect("satisfiable");
        assert_eq!(model.value(1), Some(false));
        assert!(cnf.verify(model));
    }

    #[test]
    fn test_unsat_after_search() {
        let (verdict, _) = solve(vec![vec![1, 2], vec![1, -2], vec![-1, 2], vec![-1, -2]]);
        assert_eq!(verdict, Verdict::Unsat);
    }

    #[test]
    fn test_empty_formula() {
        let (verdict, _) = solve(vec![]);
        assert_eq!(verdict, Verdict::Sat(Solutions::default()));
    }

    #[test]
    fn test_verdict_is_final() {
        let mut solver: Dpll = Dpll::new(Cnf::new(vec![vec![1, 2], vec![-1, -2]]));
        let first = solver.solve();
        assert!(first.is_sat());
        assert_eq!(solver.state(), SearchState::Sat);
        assert!(solver.state().is_terminal());
        assert!(solver.ctx.is_sat());
        assert_eq!(solver.solve(), first);
    }

    #[test]
    fn test_interrupt_and_resume() {
        let mut solver: Dpll = Dpll::new(Cnf::new(vec![vec![1, 2, 3], vec![-1, -2], vec![-2, -3]]));
        solver.set_limits(Limits {
            max_decisions: Some(0),
            ..Limits::default()
        });
        assert_eq!(solver.solve(), Verdict::Interrupted);
        assert_eq!(solver.state(), SearchState::Deciding);

        solver.set_limits(Limits::unbounded());
        assert!(solver.solve().is_sat());
    }

    #[test]
    fn test_with_watched_literals() {
        let cnf: Cnf = Cnf::new(vec![vec![1, -5, 4], vec![-1, 5, 3, 4], vec![-3, -4]]);
        let mut solver: Dpll<DefaultConfig> = Dpll::new(cnf.clone());
        assert!(cnf.verify(solver.solve().model().expect("satisfiable")));
    }
}
