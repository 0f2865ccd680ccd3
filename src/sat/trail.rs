#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::assignment::Assignment;
use crate::sat::clause::ClauseRef;
use crate::sat::literal::{Literal, Variable};
use std::ops::Index;

/// Why a variable holds its value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Copy, Hash, PartialOrd, Ord)]
pub enum Reason {
    /// A branching decision; no antecedent.
    #[default]
    Decision,
    /// Forced by the clause, which was unit at the moment of assignment.
    Clause(ClauseRef),
}

impl Reason {
    #[must_use]
    pub const fn antecedent(self) -> Option<ClauseRef> {
        match self {
            Self::Decision => None,
            Self::Clause(c_ref) => Some(c_ref),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step<L: Literal> {
    pub lit: L,
    pub decision_level: usize,
    pub reason: Reason,
}

/// Chronological record of every assignment.
///
/// Decision levels along the trail never decrease, so truncating to a level
/// always removes a suffix. `curr_idx` is the propagation head: steps before it
/// have been handed to the propagator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail<L: Literal> {
    t: Vec<Step<L>>,
    pub curr_idx: usize,
    levels: Vec<usize>,
    reasons: Vec<Reason>,
    positions: Vec<usize>,
}

impl<L: Literal> Index<usize> for Trail<L> {
    type Output = Step<L>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.t[index]
    }
}

impl<L: Literal> Trail<L> {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            t: Vec::with_capacity(num_vars),
            curr_idx: 0,
            levels: vec![0; num_vars + 1],
            reasons: vec![Reason::Decision; num_vars + 1],
            positions: vec![usize::MAX; num_vars + 1],
        }
    }

    #[must_use]
    pub fn decision_level(&self) -> usize {
        self.t.last().map_or(0, |step| step.decision_level)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step<L>> {
        self.t.iter()
    }

    /// Level at which `var` was assigned. Only meaningful while it is assigned.
    #[must_use]
    pub fn level(&self, var: Variable) -> usize {
        self.levels[var as usize]
    }

    #[must_use]
    pub fn reason(&self, var: Variable) -> Reason {
        self.reasons[var as usize]
    }

    /// Position of `var` on the trail, if assigned.
    #[must_use]
    pub fn position(&self, var: Variable) -> Option<usize> {
        let pos = self.positions[var as usize];
        (pos != usize::MAX).then_some(pos)
    }

    /// Makes `lit` true in `assignment` and records the event.
    ///
    /// # Panics
    ///
    /// If the variable of `lit` is already on the trail.
    pub fn push(
        &mut self,
        assignment: &mut Assignment,
        lit: L,
        decision_level: usize,
        reason: Reason,
    ) {
        let var = lit.variable() as usize;
        assert!(
            self.positions[var] == usize::MAX,
            "variable {var} assigned twice"
        );
        debug_assert!(decision_level >= self.decision_level());

        assignment.assign(lit);
        self.levels[var] = decision_level;
        self.reasons[var] = reason;
        self.positions[var] = self.t.len();
        self.t.push(Step {
            lit,
            decision_level,
            reason,
        });
    }

    /// Removes every step assigned above `level`, newest first, unassigning its
    /// variable and clearing its level and reason. `on_undo` sees each removed
    /// step before it is dropped.
    pub fn backstep_to(
        &mut self,
        assignment: &mut Assignment,
        level: usize,
        mut on_undo: impl FnMut(&Step<L>),
    ) {
        while let Some(step) = self.t.last() {
            if step.decision_level <= level {
                break;
            }

            let var = step.lit.variable();
            on_undo(step);
            assignment.unassign(var);
            self.levels[var as usize] = 0;
            self.reasons[var as usize] = Reason::Decision;
            self.positions[var as usize] = usize::MAX;
            self.t.pop();
        }

        self.curr_idx = self.curr_idx.min(self.t.len());
    }
}
