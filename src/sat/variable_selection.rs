#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Branching heuristics: which unassigned variable to decide on next.

use crate::sat::assignment::Assignment;
use crate::sat::cnf::Cnf;
use crate::sat::literal::{Literal, Variable};
use clap::ValueEnum;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Index;

pub trait VariableSelection: Debug {
    fn new<L: Literal>(cnf: &Cnf<L>) -> Self;

    /// An unassigned variable, or `None` once every variable is assigned.
    fn pick(&mut self, assignment: &Assignment) -> Option<Variable>;

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T);
    fn decay(&mut self, decay: f64);

    /// Called for every variable the trail unassigns.
    fn on_unassign(&mut self, _var: Variable) {}
}

/// The lowest-numbered unassigned variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedOrder;

impl VariableSelection for FixedOrder {
    fn new<L: Literal>(_: &Cnf<L>) -> Self {
        Self
    }

    fn pick(&mut self, assignment: &Assignment) -> Option<Variable> {
        assignment.unassigned().next()
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, _: T) {}

    fn decay(&mut self, _: f64) {}
}

/// A uniformly random unassigned variable, reproducible through the seed.
#[derive(Debug, Clone)]
pub struct RandomOrder(fastrand::Rng);

const RANDOM_ORDER_SEED: u64 = 0x5EED_CAFE;

impl RandomOrder {
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self(fastrand::Rng::with_seed(seed))
    }
}

impl VariableSelection for RandomOrder {
    fn new<L: Literal>(_: &Cnf<L>) -> Self {
        Self::with_seed(RANDOM_ORDER_SEED)
    }

    fn pick(&mut self, assignment: &Assignment) -> Option<Variable> {
        let count = assignment.num_vars() - assignment.num_assigned();
        if count == 0 {
            return None;
        }
        assignment.unassigned().nth(self.0.usize(..count))
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, _: T) {}

    fn decay(&mut self, _: f64) {}
}

pub const VSIDS_DECAY: f64 = 0.95;
const RESCALE_LIMIT: f64 = 1e100;

/// Variable state independent decaying sum.
///
/// Activities start at each variable's occurrence count in the input. Bumping
/// adds the current increment, and decaying grows the increment instead of
/// shrinking every activity, so recent conflicts weigh more. The heap is lazy:
/// entries are never updated in place, stale ones are skipped on pop, and every
/// unassigned variable always has one entry carrying its current activity.
#[derive(Debug, Clone, Default)]
pub struct Vsids {
    activity: Vec<f64>,
    increment: f64,
    heap: BinaryHeap<(OrderedFloat<f64>, Reverse<Variable>)>,
}

impl Index<Variable> for Vsids {
    type Output = f64;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.activity[index as usize]
    }
}

impl Vsids {
    fn push(&mut self, var: Variable) {
        self.heap
            .push((OrderedFloat(self.activity[var as usize]), Reverse(var)));
    }

    fn bump(&mut self, var: Variable) {
        self.activity[var as usize] += self.increment;
        if self.activity[var as usize] > RESCALE_LIMIT {
            self.rescale();
        } else {
            self.push(var);
        }
    }

    fn rescale(&mut self) {
        for a in &mut self.activity {
            *a /= RESCALE_LIMIT;
        }
        self.increment /= RESCALE_LIMIT;
        self.rebuild(|_| true);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn rebuild(&mut self, keep: impl Fn(Variable) -> bool) {
        self.heap = (1..self.activity.len())
            .map(|v| v as Variable)
            .filter(|&v| keep(v))
            .map(|v| (OrderedFloat(self.activity[v as usize]), Reverse(v)))
            .collect();
    }
}

impl VariableSelection for Vsids {
    fn new<L: Literal>(cnf: &Cnf<L>) -> Self {
        let mut activity = vec![0.0; cnf.num_vars + 1];
        for lit in cnf.iter().flat_map(|c| c.iter()) {
            activity[lit.variable() as usize] += 1.0;
        }

        let mut vsids = Self {
            activity,
            increment: 1.0,
            heap: BinaryHeap::new(),
        };
        vsids.rebuild(|_| true);
        vsids
    }

    fn pick(&mut self, assignment: &Assignment) -> Option<Variable> {
        if self.heap.len() > 4 * self.activity.len() {
            self.rebuild(|v| !assignment.is_assigned(v));
        }

        while let Some((OrderedFloat(activity), Reverse(var))) = self.heap.pop() {
            if activity == self.activity[var as usize] && !assignment.is_assigned(var) {
                return Some(var);
            }
        }
        None
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T) {
        for var in vars {
            self.bump(var);
        }
    }

    fn decay(&mut self, decay: f64) {
        self.increment /= decay;
    }

    fn on_unassign(&mut self, var: Variable) {
        self.push(var);
    }
}

/// Run-time choice of branching heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum VariableSelectionType {
    #[default]
    Vsids,
    FixedOrder,
    RandomOrder,
}

impl Display for VariableSelectionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vsids => write!(f, "vsids"),
            Self::FixedOrder => write!(f, "fixed-order"),
            Self::RandomOrder => write!(f, "random-order"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::PackedLiteral;

    fn cnf() -> Cnf<PackedLiteral> {
        Cnf::new(vec![vec![1, 2, 3], vec![-3, 2], vec![3, -4]])
    }

    #[test]
    fn test_fixed_order_picks_lowest() {
        let cnf = cnf();
        let mut a = Assignment::new(cnf.num_vars);
        let mut s = FixedOrder::new(&cnf);
        assert_eq!(s.pick(&a), Some(1));
        a.assign(PackedLiteral::from_i32(1));
        a.assign(PackedLiteral::from_i32(-2));
        assert_eq!(s.pick(&a), Some(3));
        a.assign(PackedLiteral::from_i32(3));
        a.assign(PackedLiteral::from_i32(4));
        assert_eq!(s.pick(&a), None);
    }

    #[test]
    fn test_vsids_prefers_frequent_variables() {
        let cnf = cnf();
        let mut a = Assignment::new(cnf.num_vars);
        let mut s = Vsids::new(&cnf);
        assert_eq!(s[3], 3.0);
        assert_eq!(s.pick(&a), Some(3));

        a.assign(PackedLiteral::from_i32(3));
        assert_eq!(s.pick(&a), Some(2));
    }

    #[test]
    fn test_vsids_bump_and_unassign() {
        let cnf = cnf();
        let mut a = Assignment::new(cnf.num_vars);
        let mut s = Vsids::new(&cnf);

        s.decay(VSIDS_DECAY);
        s.bumps([4, 4, 4]);
        assert_eq!(s.pick(&a), Some(4));

        a.assign(PackedLiteral::from_i32(4));
        assert_ne!(s.pick(&a), Some(4));

        a.unassign(4);
        s.on_unassign(4);
        assert_eq!(s.pick(&a), Some(4));
    }

    #[test]
    fn test_vsids_rescale_keeps_order() {
        let cnf = cnf();
        let a = Assignment::new(cnf.num_vars);
        let mut s = Vsids::new(&cnf);
        s.increment = RESCALE_LIMIT;
        s.bumps([1, 1]);
        assert!(s[1] <= RESCALE_LIMIT);
        assert_eq!(s.pick(&a), Some(1));
    }

    #[test]
    fn test_vsids_clone_is_independent() {
        let cnf = cnf();
        let mut a = Assignment::new(cnf.num_vars);
        let mut s = Vsids::new(&cnf);
        let mut copy = s.clone();

        s.bumps([1, 1, 1, 1]);
        assert_eq!(s.pick(&a), Some(1));
        assert_eq!(copy.pick(&a), Some(3));

        a.assign(PackedLiteral::from_i32(3));
        assert_eq!(copy.pick(&a), Some(2));
        assert_eq!(copy[1], 1.0);
    }

    #[test]
    fn test_random_order_is_reproducible() {
        let cnf = cnf();
        let mut a = Assignment::new(cnf.num_vars);
        a.assign(PackedLiteral::from_i32(2));

        let picks = |seed| {
            let mut s = RandomOrder::with_seed(seed);
            (0..16).map(|_| s.pick(&a)).collect::<Vec<_>>()
        };
        let first = picks(7);
        assert_eq!(first, picks(7));
        assert!(first.iter().all(|p| p.is_some_and(|v| v != 2)));
    }
}
