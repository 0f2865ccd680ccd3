#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::Solutions;
use core::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn value(self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(b),
            Self::Unassigned => None,
        }
    }
}

/// Dense per-variable truth values, indexed by variable number. Slot 0 is unused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    states: Vec<VarState>,
    assigned: usize,
}

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.states[index as usize]
    }
}

impl Assignment {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            states: vec![VarState::Unassigned; num_vars + 1],
            assigned: 0,
        }
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.states.len() - 1
    }

    /// Makes `lit` true.
    pub fn assign<L: Literal>(&mut self, lit: L) {
        let state = &mut self.states[lit.variable() as usize];
        if state.is_unassigned() {
            self.assigned += 1;
        }
        *state = VarState::Assigned(lit.polarity());
    }

    pub fn unassign(&mut self, var: Variable) {
        let state = &mut self.states[var as usize];
        if state.is_assigned() {
            self.assigned -= 1;
        }
        *state = VarState::Unassigned;
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        self.states.get(var as usize).copied().and_then(VarState::value)
    }

    /// `Some(true)` if the literal is satisfied, `Some(false)` if falsified,
    /// `None` while its variable is unassigned.
    #[must_use]
    pub fn literal_value<L: Literal>(&self, lit: L) -> Option<bool> {
        self.var_value(lit.variable())
            .map(|value| value == lit.polarity())
    }

    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self[var].is_assigned()
    }

    #[must_use]
    pub const fn num_assigned(&self) -> usize {
        self.assigned
    }

    #[must_use]
    pub fn all_assigned(&self) -> bool {
        self.assigned == self.num_vars()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn unassigned(&self) -> impl Iterator<Item = Variable> + '_ {
        self.states
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, s)| s.is_unassigned())
            .map(|(i, _)| i as Variable)
    }

    /// The current assignment as a model. Unassigned variables are reported false,
    /// so this is only a total model once [`Self::all_assigned`] holds.
    #[must_use]
    pub fn get_solutions(&self) -> Solutions {
        Solutions::new(
            self.states
                .iter()
                .skip(1)
                .map(|s| s.value().unwrap_or(false)),
        )
    }
}
