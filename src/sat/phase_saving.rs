#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::{Literal, Variable};
use bit_vec::BitVec;

/// Last polarity each variable held. Decisions reuse it, so a backjump does not
/// throw away the parts of the assignment that were not involved in a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SavedPhases(BitVec);

impl SavedPhases {
    /// Every variable starts out preferring `true`.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(BitVec::from_elem(num_vars + 1, true))
    }

    pub fn save<L: Literal>(&mut self, lit: L) {
        self.0.set(lit.variable() as usize, lit.polarity());
    }

    #[must_use]
    pub fn get(&self, var: Variable) -> bool {
        self.0.get(var as usize).unwrap_or(true)
    }
}
