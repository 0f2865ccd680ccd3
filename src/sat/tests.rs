use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use crate::sat::cdcl::Cdcl;
use crate::sat::cnf::Cnf;
use crate::sat::dpll::Dpll;
use crate::sat::literal::{Literal, PackedLiteral};
use crate::sat::propagation::{ClauseStatus, OccurrenceLists, WatchedLiterals};
use crate::sat::solver::{
    Config, DefaultConfig, Limits, NaiveConfig, SearchState, Solver, SolverConfig, Verdict,
};
use crate::sat::state::SearchContext;
use crate::sat::trail::Reason;
use crate::sat::variable_selection::{FixedOrder, RandomOrder};

/// A random formula over at most eight variables, small enough to check by
/// enumerating every assignment.
#[derive(Debug, Clone)]
struct SmallCnf {
    clauses: Vec<Vec<i32>>,
}

#[allow(clippy::cast_possible_wrap)]
fn literal(g: &mut Gen, num_vars: u32) -> i32 {
    let var = (1 + u32::arbitrary(g) % num_vars) as i32;
    if bool::arbitrary(g) { var } else { -var }
}

impl Arbitrary for SmallCnf {
    fn arbitrary(g: &mut Gen) -> Self {
        let num_vars = 1 + u32::arbitrary(g) % 8;
        let num_clauses = usize::arbitrary(g) % 32;
        let clauses = (0..num_clauses)
            .map(|_| {
                let len = 1 + usize::arbitrary(g) % 3;
                (0..len).map(|_| literal(g, num_vars)).collect()
            })
            .collect();
        Self { clauses }
    }
}

/// Decisions to replay against the propagators.
#[derive(Debug, Clone)]
struct Decisions(Vec<i32>);

impl Arbitrary for Decisions {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 8;
        Self((0..len).map(|_| literal(g, 8)).collect())
    }
}

fn brute_force<L: Literal>(cnf: &Cnf<L>) -> bool {
    (0..1u32 << cnf.num_vars).any(|mask| {
        cnf.originals().all(|clause| {
            clause
                .iter()
                .any(|lit| (mask >> (lit.variable() - 1) & 1 == 1) == lit.polarity())
        })
    })
}

fn decides_correctly<C: SolverConfig, S: Solver<C>>(formula: &SmallCnf) -> bool {
    let cnf: Cnf<C::Literal> = Cnf::new(formula.clauses.clone());
    let satisfiable = brute_force(&cnf);

    let mut solver = S::new(cnf.clone());
    match solver.solve() {
        Verdict::Sat(model) => satisfiable && model.len() == cnf.num_vars && cnf.verify(&model),
        Verdict::Unsat => !satisfiable,
        Verdict::Interrupted => false,
    }
}

#[quickcheck]
fn cdcl_decides_correctly(formula: SmallCnf) -> bool {
    decides_correctly::<DefaultConfig, Cdcl<DefaultConfig>>(&formula)
}

#[quickcheck]
fn cdcl_with_occurrence_lists_decides_correctly(formula: SmallCnf) -> bool {
    decides_correctly::<NaiveConfig, Cdcl<NaiveConfig>>(&formula)
}

#[quickcheck]
fn cdcl_with_random_order_decides_correctly(formula: SmallCnf) -> bool {
    type C = Config<PackedLiteral, WatchedLiterals, RandomOrder>;
    decides_correctly::<C, Cdcl<C>>(&formula)
}

#[quickcheck]
fn dpll_decides_correctly(formula: SmallCnf) -> bool {
    decides_correctly::<NaiveConfig, Dpll<NaiveConfig>>(&formula)
}

#[quickcheck]
fn dpll_with_watched_literals_decides_correctly(formula: SmallCnf) -> bool {
    decides_correctly::<DefaultConfig, Dpll<DefaultConfig>>(&formula)
}

#[quickcheck]
fn dpll_and_cdcl_agree(formula: SmallCnf) -> bool {
    let cnf: Cnf = Cnf::new(formula.clauses);
    let mut dpll: Dpll<DefaultConfig> = Dpll::new(cnf.clone());
    let mut cdcl: Cdcl = Cdcl::new(cnf);
    dpll.solve().is_sat() == cdcl.solve().is_sat()
}

type Watched = Config<PackedLiteral, WatchedLiterals, FixedOrder>;
type Counted = Config<PackedLiteral, OccurrenceLists, FixedOrder>;

fn same_fixpoint(a: &SearchContext<Watched>, b: &SearchContext<Counted>) -> bool {
    a.assignment == b.assignment
        && (0..a.cnf.len()).all(|c_ref| a.clause_status(c_ref) == b.clause_status(c_ref))
}

/// Every clause status reported by the engine matches a full scan of the
/// assignment, whether or not the trail has been propagated to the end.
fn statuses_are_exact<C: SolverConfig>(ctx: &SearchContext<C>) -> bool {
    (0..ctx.cnf.len()).all(|c_ref| {
        ctx.clause_status(c_ref) == ClauseStatus::evaluate(&ctx.cnf[c_ref], &ctx.assignment)
    })
}

/// Both engines answer exactly in any trail state. Without a conflict they also
/// sit on the same fixpoint; after one, they agree clause by clause wherever
/// their assignments coincide.
fn engines_agree(a: &SearchContext<Watched>, b: &SearchContext<Counted>, conflict: bool) -> bool {
    statuses_are_exact(a)
        && statuses_are_exact(b)
        && if conflict {
            a.assignment != b.assignment || same_fixpoint(a, b)
        } else {
            same_fixpoint(a, b)
        }
}

#[quickcheck]
fn propagators_reach_the_same_fixpoint(formula: SmallCnf, decisions: Decisions) -> bool {
    let cnf: Cnf = Cnf::new(formula.clauses);
    let mut watched = SearchContext::<Watched>::new(cnf.clone());
    let mut counted = SearchContext::<Counted>::new(cnf);

    if watched.state != counted.state {
        return false;
    }
    if watched.state != SearchState::Propagating {
        return statuses_are_exact(&watched) && statuses_are_exact(&counted);
    }

    let mut conflict = (watched.propagate().is_some(), counted.propagate().is_some());

    for lit in decisions.0 {
        if conflict.0 != conflict.1 || !engines_agree(&watched, &counted, conflict.0) {
            return false;
        }
        if conflict.0 {
            break;
        }

        let lit = PackedLiteral::from_i32(lit);
        if lit.variable() as usize > watched.cnf.num_vars
            || watched.assignment.is_assigned(lit.variable())
        {
            continue;
        }

        watched.decide(lit);
        counted.decide(lit);
        conflict = (watched.propagate().is_some(), counted.propagate().is_some());
    }

    if conflict.0 != conflict.1 || !engines_agree(&watched, &counted, conflict.0) {
        return false;
    }

    watched.backtrack_to(0);
    counted.backtrack_to(0);
    engines_agree(&watched, &counted, conflict.0)
}

/// Interrupting after a few conflicts leaves a trail that is ordered by level,
/// never above the current level, and whose implied literals are justified by their
/// antecedents.
#[quickcheck]
fn trail_stays_consistent(formula: SmallCnf, conflicts: u8) -> bool {
    let mut solver: Cdcl = Cdcl::new(Cnf::new(formula.clauses));
    solver.set_limits(Limits {
        max_conflicts: Some(usize::from(conflicts % 4)),
        ..Limits::default()
    });
    if solver.solve() != Verdict::Interrupted {
        return true;
    }

    let ctx = &solver.ctx;
    let steps: Vec<_> = ctx.trail.iter().collect();

    let ordered = steps
        .windows(2)
        .all(|w| w[0].decision_level <= w[1].decision_level);
    let bounded = steps
        .iter()
        .all(|s| s.decision_level <= ctx.decision_level);
    let counted = steps.len() == ctx.assignment.num_assigned();
    let justified = steps.iter().all(|step| match step.reason {
        Reason::Decision => step.decision_level > 0,
        Reason::Clause(c_ref) => ctx.cnf[c_ref].iter().all(|&lit| {
            if lit == step.lit {
                true
            } else {
                ctx.assignment.literal_value(lit) == Some(false)
                    && ctx.trail.position(lit.variable()) < ctx.trail.position(step.lit.variable())
            }
        }),
    });

    ordered && bounded && counted && justified
}

#[test]
fn test_contradicting_units_are_unsat_everywhere() {
    let clauses = vec![vec![1], vec![-1]];
    let mut cdcl: Cdcl = Cdcl::new(Cnf::new(clauses.clone()));
    let mut dpll: Dpll = Dpll::new(Cnf::new(clauses));
    assert_eq!(cdcl.solve(), Verdict::Unsat);
    assert_eq!(dpll.solve(), Verdict::Unsat);
}

#[test]
fn test_scenario_in_every_mode() {
    let clauses = vec![vec![1, -5, 4], vec![-1, 5, 3, 4], vec![-3, -4]];
    let formula = SmallCnf { clauses };
    assert!(decides_correctly::<DefaultConfig, Cdcl<DefaultConfig>>(&formula));
    assert!(decides_correctly::<NaiveConfig, Cdcl<NaiveConfig>>(&formula));
    assert!(decides_correctly::<NaiveConfig, Dpll<NaiveConfig>>(&formula));
    assert!(decides_correctly::<DefaultConfig, Dpll<DefaultConfig>>(&formula));
}
