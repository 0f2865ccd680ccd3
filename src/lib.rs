//! A CNF satisfiability solver with DPLL and CDCL search.
//!
//! Formulas come in as DIMACS text through [`sat::dimacs`], are validated into
//! a [`sat::cnf::Cnf`], and are decided by [`sat::cdcl::Cdcl`] or
//! [`sat::dpll::Dpll`], both implementing [`sat::solver::Solver`].

/// The `sat` module implements the solver: data model, propagation, conflict
/// analysis and the search drivers.
pub mod sat;
