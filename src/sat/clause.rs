#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::assignment::Assignment;
use crate::sat::literal::Literal;
use core::ops::Index;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// Stable reference to a clause: its insertion index in the clause database.
pub type ClauseRef = usize;

/// A disjunction of literals.
///
/// Literals are deduplicated on construction, so a clause never watches the same
/// literal twice. Positions 0 and 1 are the watched pair when the watched-literal
/// engine is in use; it is free to permute the literals, which leaves the clause's
/// meaning unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause<L: Literal> {
    pub literals: SmallVec<[L; 8]>,
    pub learnt: bool,
}

impl<L: Literal> Clause<L> {
    /// Builds a clause from DIMACS literals. Callers are expected to have rejected
    /// literal `0` already.
    #[must_use]
    pub fn new(literals: &[i32]) -> Self {
        literals.iter().copied().map(L::from_i32).collect()
    }

    #[must_use]
    pub fn learnt(literals: impl IntoIterator<Item = L>) -> Self {
        let mut clause: Self = literals.into_iter().collect();
        clause.learnt = true;
        clause
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &L> {
        self.literals.iter()
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.literals.swap(i, j);
    }

    /// True when the clause contains a literal and its negation.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        let mut seen = FxHashSet::default();
        self.iter().any(|&lit| {
            seen.insert(lit);
            seen.contains(&lit.negated())
        })
    }

    #[must_use]
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.iter()
            .any(|&lit| assignment.literal_value(lit) == Some(true))
    }

    #[must_use]
    pub fn is_falsified_by(&self, assignment: &Assignment) -> bool {
        self.iter()
            .all(|&lit| assignment.literal_value(lit) == Some(false))
    }

    pub fn to_i32s(&self) -> impl Iterator<Item = i32> + '_ {
        self.iter().map(|lit| lit.to_i32())
    }
}

impl<L: Literal> FromIterator<L> for Clause<L> {
    fn from_iter<T: IntoIterator<Item = L>>(iter: T) -> Self {
        Self {
            literals: iter.into_iter().unique().collect(),
            learnt: false,
        }
    }
}

impl<L: Literal> Index<usize> for Clause<L> {
    type Output = L;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl<L: Literal> Display for Clause<L> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0", self.to_i32s().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;

    type TestClause = Clause<PackedLiteral>;

    #[test]
    fn test_new() {
        let clause = TestClause::new(&[1, 2, 3]);
        assert_eq!(clause.len(), 3);
        assert!(!clause.learnt);
    }

    #[test]
    fn test_duplicates_collapse() {
        let clause = TestClause::new(&[1, 2, 1, 2, -3]);
        assert_eq!(clause.to_i32s().collect_vec(), vec![1, 2, -3]);
    }

    #[test]
    fn test_swap() {
        let mut clause = TestClause::new(&[1, 2, 3]);
        clause.swap(0, 2);
        assert_eq!(clause[0], PackedLiteral::from_i32(3));
        assert_eq!(clause[1], PackedLiteral::from_i32(2));
        assert_eq!(clause[2], PackedLiteral::from_i32(1));
    }

    #[test]
    fn test_tautology() {
        assert!(TestClause::new(&[1, -2, 2]).is_tautology());
        assert!(!TestClause::new(&[1, -2, 3]).is_tautology());
    }

    #[test]
    fn test_evaluation() {
        let clause = TestClause::new(&[1, -2]);
        let mut assignment = Assignment::new(2);
        assert!(!clause.is_satisfied_by(&assignment));
        assert!(!clause.is_falsified_by(&assignment));

        assignment.assign(PackedLiteral::from_i32(-1));
        assignment.assign(PackedLiteral::from_i32(2));
        assert!(clause.is_falsified_by(&assignment));

        assignment.assign(PackedLiteral::from_i32(-2));
        assert!(clause.is_satisfied_by(&assignment));
    }

    #[test]
    fn test_display() {
        let clause = TestClause::new(&[4, -1]);
        assert_eq!(clause.to_string(), "4 -1 0");
    }
}
