#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict-driven clause learning.
//!
//! Every conflict above the root is analysed into a 1UIP clause, which is added
//! to the database. The search then jumps back to the second highest level in
//! that clause, where it is unit, and asserts its first literal. Decisions take
//! the VSIDS favourite with its saved phase.

use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::conflict_analysis::{Analyser, Conflict};
use crate::sat::literal::Literal;
use crate::sat::solver::{
    DefaultConfig, Limits, SearchState, SolutionStats, Solutions, Solver, SolverConfig, Verdict,
};
use crate::sat::state::SearchContext;
use crate::sat::trail::Reason;
use crate::sat::variable_selection::{VSIDS_DECAY, VariableSelection};
use log::{debug, info, trace};

#[derive(Debug)]
pub struct Cdcl<Config: SolverConfig = DefaultConfig> {
    pub ctx: SearchContext<Config>,
    analyser: Analyser,
}

impl<Config: SolverConfig> Solver<Config> for Cdcl<Config> {
    fn new(cnf: Cnf<Config::Literal>) -> Self {
        Self {
            analyser: Analyser::new(cnf.num_vars),
            ctx: SearchContext::new(cnf),
        }
    }

    fn solve(&mut self) -> Verdict {
        self.ctx.start_clock();
        info!(
            "cdcl: {} variables, {} clauses",
            self.ctx.cnf.num_vars,
            self.ctx.cnf.non_learnt_idx
        );

        loop {
            match self.ctx.state {
                SearchState::Propagating => {
                    self.ctx.state = match self.ctx.propagate() {
                        Some(c_ref) => SearchState::Conflict(c_ref),
                        None if self.ctx.all_assigned() => SearchState::Sat,
                        None => SearchState::Deciding,
                    };
                }
                SearchState::Deciding => {
                    if self.ctx.limits_exhausted() {
                        debug!("cdcl: limits reached after {:?}", self.ctx.stats);
                        return Verdict::Interrupted;
                    }
                    self.decide();
                }
                SearchState::Conflict(c_ref) => {
                    self.ctx.stats.conflicts += 1;
                    self.ctx.state = if self.ctx.decision_level == 0 {
                        SearchState::Unsat
                    } else {
                        self.learn_from(c_ref)
                    };
                }
                SearchState::Sat => {
                    let solutions = self.solutions();
                    debug_assert!(self.ctx.is_sat(), "model falsifies a clause");
                    info!("cdcl: satisfiable, {:?}", self.ctx.stats);
                    return Verdict::Sat(solutions);
                }
                SearchState::Unsat => {
                    info!("cdcl: unsatisfiable, {:?}", self.ctx.stats);
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

impl<Config: SolverConfig> Cdcl<Config> {
    /// # Panics
    ///
    /// If the selector returns no variable while some are unassigned.
    fn decide(&mut self) {
        let var = self
            .ctx
            .selector
            .pick(&self.ctx.assignment)
            .unwrap_or_else(|| panic!("no variable to decide on with unassigned variables left"));

        let lit = Config::Literal::new(var, self.ctx.phases.get(var));
        trace!("cdcl: decide {lit:?} at level {}", self.ctx.decision_level + 1);
        self.ctx.decide(lit);
        self.ctx.state = SearchState::Propagating;
    }

    /// Analyses the falsified clause, learns from it and jumps back.
    fn learn_from(&mut self, c_ref: usize) -> SearchState {
        let conflict = self.analyser.analyse(&self.ctx.cnf, &self.ctx.trail, c_ref);

        self.ctx.selector.bumps(self.analyser.bumped().iter().copied());
        self.ctx.selector.decay(VSIDS_DECAY);

        let (clause, level) = match conflict {
            Conflict::Ground => return SearchState::Unsat,
            Conflict::Unit(lit) => (Clause::learnt([lit]), 0),
            Conflict::Learned(clause, level) => (clause, level),
        };

        debug!(
            "cdcl: conflict at level {}, learnt {} literals, backjump to {level}",
            self.ctx.decision_level,
            clause.len()
        );

        debug_assert!(!clause.is_tautology(), "learnt a tautology");
        let asserting = clause[0];
        self.ctx.backtrack_to(level);
        let learnt = self.ctx.learn(clause);
        self.ctx.enqueue(asserting, Reason::Clause(learnt));

        SearchState::Propagating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;
    use crate::sat::propagation::WatchedLiterals;
    use crate::sat::solver::{Config, NaiveConfig};
    use crate::sat::variable_selection::FixedOrder;

    fn solve(clauses: Vec<Vec<i32>>) -> (Verdict, Cnf) {
        let cnf: Cnf = Cnf::new(clauses);
        let mut solver: Cdcl = Cdcl::new(cnf.clone());
        (solver.solve(), cnf)
    }

    /// `n + 1` pigeons in `n` holes.
    fn pigeonhole(n: i32) -> Vec<Vec<i32>> {
        let var = |pigeon: i32, hole: i32| pigeon * n + hole + 1;
        let mut clauses: Vec<Vec<i32>> = (0..=n)
            .map(|p| (0..n).map(|h| var(p, h)).collect())
            .collect();
        for h in 0..n {
            for p in 0..=n {
                for q in p + 1..=n {
                    clauses.push(vec![-var(p, h), -var(q, h)]);
                }
            }
        }
        clauses
    }

    #[test]
    fn test_contradicting_units() {
        assert_eq!(solve(vec![vec![1], vec![-1]]).0, Verdict::Unsat);
    }

    #[test]
    fn test_single_clause() {
        let (verdict, cnf) = solve(vec![vec![1, -2, 3]]);
        assert!(cnf.verify(verdict.model().expect("satisfiable")));
    }

    #[test]
    fn test_scenario() {
        let (verdict, cnf) = solve(vec![vec![1, -5, 4], vec![-1, 5, 3, 4], vec![-3, -4]]);
        assert!(cnf.verify(verdict.model().expect("satisfiable")));
    }

    #[test]
    fn test_sat_state_satisfies_every_clause() {
        let mut solver: Cdcl = Cdcl::new(Cnf::new(vec![vec![1, -5, 4], vec![-1, 5, 3, 4], vec![-3, -4]]));
        assert!(solver.solve().is_sat());
        assert_eq!(solver.state(), SearchState::Sat);
        assert!(solver.ctx.is_sat());
    }

    #[test]
    fn test_pigeonhole_is_unsat() {
        let clauses = pigeonhole(4);
        let cnf: Cnf = Cnf::new(clauses);
        let mut solver: Cdcl = Cdcl::new(cnf);
        assert_eq!(solver.solve(), Verdict::Unsat);
        assert!(solver.stats().conflicts > 0);
        assert!(solver.stats().learnt_clauses > 0);
    }

    #[test]
    fn test_learnt_clauses_are_appended() {
        let cnf: Cnf = Cnf::new(pigeonhole(3));
        let originals = cnf.len();
        let mut solver: Cdcl = Cdcl::new(cnf);
        solver.solve();
        assert_eq!(solver.ctx.cnf.non_learnt_idx, originals);
        assert_eq!(solver.ctx.cnf.num_learnt(), solver.stats().learnt_clauses);
        assert!(solver.ctx.cnf.iter().skip(originals).all(|c| c.learnt));
    }

    #[test]
    fn test_backjump_skips_levels() {
        // Decisions 1, 2, 3 and 4 in order; the conflict only involves 1 and 4.
        let clauses = vec![vec![-4, 5], vec![-4, 6], vec![-5, -6, -1], vec![2, 3, 7]];
        let mut solver: Cdcl<Config<PackedLiteral, WatchedLiterals, FixedOrder>> =
            Cdcl::new(Cnf::new(clauses));
        solver.set_limits(Limits {
            max_conflicts: Some(1),
            ..Limits::default()
        });
        assert_eq!(solver.solve(), Verdict::Interrupted);

        let ctx = &solver.ctx;
        assert_eq!(ctx.decision_level, 1);
        assert_eq!(ctx.assignment.var_value(4), Some(false));
        assert_eq!(ctx.trail.level(4), 1);
        assert_eq!(ctx.assignment.var_value(2), None);
        assert_eq!(ctx.assignment.var_value(3), None);

        let learnt = &ctx.cnf[ctx.cnf.non_learnt_idx];
        assert_eq!(learnt.to_i32s().collect::<Vec<_>>(), vec![-4, -1]);
    }

    #[test]
    fn test_decision_levels_after_backjump() {
        let mut solver: Cdcl = Cdcl::new(Cnf::new(pigeonhole(3)));
        solver.set_limits(Limits {
            max_conflicts: Some(3),
            ..Limits::default()
        });
        assert_eq!(solver.solve(), Verdict::Interrupted);

        let ctx = &solver.ctx;
        assert!(ctx.trail.iter().all(|s| s.decision_level <= ctx.decision_level));
        assert!(
            ctx.trail
                .iter()
                .zip(ctx.trail.iter().skip(1))
                .all(|(a, b)| a.decision_level <= b.decision_level)
        );
        assert_eq!(ctx.trail.len(), ctx.assignment.num_assigned());
    }

    #[test]
    fn test_naive_propagation() {
        let cnf = Cnf::new(pigeonhole(3));
        let mut solver: Cdcl<NaiveConfig> = Cdcl::new(cnf);
        assert_eq!(solver.solve(), Verdict::Unsat);
    }

    #[test]
    fn test_interrupt_and_resume() {
        let mut solver: Cdcl = Cdcl::new(Cnf::new(pigeonhole(4)));
        solver.set_limits(Limits {
            max_conflicts: Some(1),
            ..Limits::default()
        });
        assert_eq!(solver.solve(), Verdict::Interrupted);
        let conflicts = solver.stats().conflicts;
        assert!(conflicts >= 1);

        solver.set_limits(Limits::unbounded());
        assert_eq!(solver.solve(), Verdict::Unsat);
        assert!(solver.stats().conflicts > conflicts);
        assert_eq!(solver.solve(), Verdict::Unsat);
    }
}
