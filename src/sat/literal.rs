#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Literal and variable model.
//!
//! A literal is a nonzero signed integer in DIMACS terms: the magnitude names the
//! variable and the sign its polarity. Internally the solver is generic over the
//! [`Literal`] trait so that different encodings can be compared; every encoding
//! converts losslessly to and from the DIMACS `i32` form.

use core::ops::{Neg, Not};
use std::fmt::Debug;
use std::hash::Hash;

/// Variables are positive integers, `1..=num_vars`.
pub type Variable = u32;

/// The variable of a DIMACS literal, `|lit|`.
#[must_use]
pub const fn var_of(lit: i32) -> Variable {
    lit.unsigned_abs()
}

/// The polarity of a DIMACS literal, `lit > 0`.
#[must_use]
pub const fn polarity(lit: i32) -> bool {
    lit > 0
}

pub trait Literal: Copy + Debug + Eq + Hash + Default {
    fn new(var: Variable, polarity: bool) -> Self;
    fn variable(self) -> Variable;
    fn polarity(self) -> bool;

    #[must_use]
    fn negated(self) -> Self;

    fn is_negated(self) -> bool {
        !self.polarity()
    }

    /// Dense index of the literal, `2 * var + is_negated`. Used to address
    /// per-literal tables such as watch lists.
    fn index(self) -> usize {
        ((self.variable() as usize) << 1) | usize::from(self.is_negated())
    }

    #[must_use]
    fn from_i32(value: i32) -> Self {
        debug_assert_ne!(value, 0, "literal 0 is not a literal");
        Self::new(var_of(value), polarity(value))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn to_i32(self) -> i32 {
        let var = self.variable() as i32;
        if self.polarity() { var } else { -var }
    }
}

/// Variable in the low 31 bits, polarity in the top bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PackedLiteral(u32);

const POLARITY_BIT: u32 = 0x8000_0000;

impl Literal for PackedLiteral {
    fn new(var: Variable, polarity: bool) -> Self {
        debug_assert!(var < POLARITY_BIT, "variable {var} does not fit a packed literal");
        Self((var & !POLARITY_BIT) | (u32::from(polarity) << 31))
    }

    fn variable(self) -> Variable {
        self.0 & !POLARITY_BIT
    }

    fn polarity(self) -> bool {
        self.0 & POLARITY_BIT != 0
    }

    fn negated(self) -> Self {
        Self(self.0 ^ POLARITY_BIT)
    }
}

/// The DIMACS representation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NegativeLiteral(i32);

impl Literal for NegativeLiteral {
    #[allow(clippy::cast_possible_wrap)]
    fn new(var: Variable, polarity: bool) -> Self {
        let var = var as i32;
        if polarity { Self(var) } else { Self(-var) }
    }

    fn variable(self) -> Variable {
        self.0.unsigned_abs()
    }

    fn polarity(self) -> bool {
        self.0.is_positive()
    }

    fn negated(self) -> Self {
        Self(-self.0)
    }

    fn from_i32(value: i32) -> Self {
        debug_assert_ne!(value, 0, "literal 0 is not a literal");
        Self(value)
    }

    fn to_i32(self) -> i32 {
        self.0
    }
}

macro_rules! impl_negation {
    ($($lit:ty),*) => {
        $(
            impl Neg for $lit {
                type Output = Self;

                fn neg(self) -> Self::Output {
                    self.negated()
                }
            }

            impl Not for $lit {
                type Output = Self;

                fn not(self) -> Self::Output {
                    self.negated()
                }
            }
        )*
    };
}

impl_negation!(PackedLiteral, NegativeLiteral);
