use std::num::NonZeroI32;

use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use super::CoreGuidedSearch;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::StorageKey;
use crate::engine::test_oracle::ScriptedOracle;
use crate::engine::ClausalSolver;
use crate::engine::Model;
use crate::engine::OracleProtocolError;
use crate::engine::OracleResult;
use crate::engine::SatOracle;
use crate::formula::Formula;
use crate::formula::SoftClauseId;
use crate::optimisation::objective::TermId;
use crate::optimisation::CoreGuidedOptions;
use crate::optimisation::CoreMinimisation;
use crate::optimisation::MaxSatError;
use crate::results::MaxSatSolution;

fn lit(dimacs: i32) -> Literal {
    Literal::from_dimacs(NonZeroI32::new(dimacs).unwrap())
}

fn clause(dimacs: &[i32]) -> Vec<Literal> {
    dimacs.iter().map(|&literal| lit(literal)).collect()
}

fn formula(clauses: impl IntoIterator<Item = (Vec<i32>, Option<u64>)>) -> Formula {
    Formula::new(
        clauses
            .into_iter()
            .map(|(literals, weight)| (clause(&literals), weight)),
    )
}

/// Options under which every oracle call is made by the main loop.
fn scripted_options() -> CoreGuidedOptions {
    CoreGuidedOptions {
        exhaustion: false,
        core_minimisation: CoreMinimisation::None,
        ..CoreGuidedOptions::default()
    }
}

fn variable(index: u32) -> PropositionalVariable {
    PropositionalVariable::new(index)
}

/// A model which also assigns the constant variable zero.
fn model(values: &[bool]) -> Model {
    Model::new(std::iter::once(true).chain(values.iter().copied()))
}

fn solve_with(
    formula: Formula,
    options: CoreGuidedOptions,
) -> (Result<MaxSatSolution, MaxSatError>, Vec<u64>) {
    let mut search = CoreGuidedSearch::new(formula, ClausalSolver::default(), options);
    let result = search.solve();
    (result, search.lower_bound_history.clone())
}

fn solve(formula: Formula) -> Result<MaxSatSolution, MaxSatError> {
    solve_with(formula, CoreGuidedOptions::default()).0
}

#[test]
fn unit_core_fixes_the_relaxation_literal() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1], Some(5)), (vec![-1], None)]),
        ScriptedOracle::new([
            OracleResult::UnsatisfiableUnderAssumptions(vec![lit(1)]),
            OracleResult::Satisfiable(model(&[false])),
        ]),
        scripted_options(),
    );

    let solution = search.solve().expect("feasible");

    assert_eq!(solution.cost(), 5);
    assert!(!solution.value(variable(1)));
    assert_eq!(search.oracle().calls, vec![vec![lit(1)], vec![]]);
    assert_eq!(search.oracle().clauses, vec![clause(&[-1]), clause(&[-1])]);
    assert_eq!(search.lower_bound_history, vec![0, 5]);
}

#[test]
fn core_weights_are_split() {
    let relaxed_formula = || formula([(vec![1, 2], Some(3)), (vec![3, 4], Some(5))]);
    // Relaxation literals 5 and 6, and the outputs 7 and 8 of the sum over them.
    let optimal_model = model(&[false, false, true, false, true, false, true, false]);
    let options = CoreGuidedOptions {
        stratification: false,
        ..scripted_options()
    };

    let run = |core: Vec<Literal>| {
        let mut search = CoreGuidedSearch::new(
            relaxed_formula(),
            ScriptedOracle::new([
                OracleResult::UnsatisfiableUnderAssumptions(core),
                OracleResult::Satisfiable(optimal_model.clone()),
            ]),
            options,
        );
        let solution = search.solve().expect("feasible");
        assert_eq!(solution.cost(), 3);
        assert_eq!(search.lower_bound_history, vec![0, 3]);

        let heavier_term = search.objective.term(TermId::create_from_index(1));
        assert_eq!(heavier_term.residual_weight, 2);
        let used_up_term = search.objective.term(TermId::create_from_index(0));
        assert_eq!(used_up_term.residual_weight, 0);

        (
            search.oracle().clauses.clone(),
            search.oracle().calls.clone(),
        )
    };

    let (clauses, calls) = run(clause(&[-6, -5]));
    assert_eq!(
        clauses,
        vec![
            clause(&[1, 2, 5]),
            clause(&[3, 4, 6]),
            clause(&[-6, 7]),
            clause(&[-5, 7]),
            clause(&[-5, -6, 8]),
        ]
    );
    assert_eq!(calls, vec![clause(&[-5, -6]), clause(&[-6, -8])]);

    // The order of the core does not matter.
    assert_eq!(run(clause(&[-5, -6])), (clauses, calls));
}

#[test]
fn terms_which_exceed_the_upper_bound_are_hardened() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1], Some(10)), (vec![2], Some(1))]),
        ScriptedOracle::new([
            OracleResult::Satisfiable(model(&[true, false])),
            OracleResult::UnsatisfiableUnderAssumptions(vec![lit(2)]),
        ]),
        scripted_options(),
    );

    let solution = search.solve().expect("feasible");

    assert_eq!(solution.cost(), 1);
    // The hardened soft clause is not assumed anymore.
    assert_eq!(search.oracle().calls, vec![clause(&[1]), clause(&[2])]);
    assert_eq!(search.oracle().clauses, vec![clause(&[1]), clause(&[-2])]);

    let hardened = SoftClauseId::create_from_index(0);
    assert!(search.formula().soft_clause(hardened).is_hardened());
    assert!(search.formula().hard_clauses().any(|hard| hard == clause(&[1])));
    assert_eq!(
        search
            .formula()
            .soft_clauses()
            .map(|(id, _)| id)
            .collect::<Vec<_>>(),
        vec![SoftClauseId::create_from_index(1)]
    );
}

#[test]
fn model_without_violations_hardens_every_tier() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1], Some(10)), (vec![2], Some(6)), (vec![3], Some(1))]),
        ScriptedOracle::new([OracleResult::Satisfiable(model(&[true, true, true]))]),
        scripted_options(),
    );

    let solution = search.solve().expect("feasible");

    assert_eq!(solution.cost(), 0);
    assert_eq!(search.oracle().calls, vec![clause(&[1])]);
    assert_eq!(
        search.oracle().clauses,
        vec![clause(&[1]), clause(&[2]), clause(&[3])]
    );
    assert_eq!(search.formula().soft_clauses().count(), 0);
}

#[test]
fn core_literal_outside_of_the_assumptions_is_rejected() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1], Some(1)), (vec![2], Some(1))]),
        ScriptedOracle::new([OracleResult::UnsatisfiableUnderAssumptions(vec![
            lit(1),
            lit(-2),
        ])]),
        scripted_options(),
    );

    assert_eq!(
        search.solve(),
        Err(MaxSatError::OracleProtocol(
            OracleProtocolError::CoreLiteralNotAssumed(lit(-2))
        ))
    );
}

#[test]
fn empty_core_is_rejected() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1], Some(1))]),
        ScriptedOracle::new([OracleResult::UnsatisfiableUnderAssumptions(vec![])]),
        scripted_options(),
    );

    assert_eq!(
        search.solve(),
        Err(MaxSatError::OracleProtocol(OracleProtocolError::EmptyCore))
    );
}

#[test]
fn incomplete_model_is_rejected() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1, 2], Some(1))]),
        ScriptedOracle::new([OracleResult::Satisfiable(model(&[true, true]))]),
        scripted_options(),
    );

    // Variable 3 relaxes the soft clause.
    assert_eq!(
        search.solve(),
        Err(MaxSatError::OracleProtocol(
            OracleProtocolError::IncompleteModel {
                covered: 3,
                required: 4
            }
        ))
    );
}

#[test]
fn unknown_without_budget_is_rejected() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1], Some(1))]),
        ScriptedOracle::new([OracleResult::Unknown]),
        scripted_options(),
    );

    assert_eq!(
        search.solve(),
        Err(MaxSatError::OracleProtocol(
            OracleProtocolError::UnexpectedUnknown
        ))
    );
}

#[test]
fn unsatisfiable_oracle_means_infeasible_hard_clauses() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1], Some(1))]),
        ScriptedOracle::new([OracleResult::Unsatisfiable]),
        scripted_options(),
    );

    assert_eq!(search.solve(), Err(MaxSatError::HardClausesUnsatisfiable));
}

#[test]
fn soft_weights_beyond_u64_are_rejected() {
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1], Some(u64::MAX)), (vec![-1], Some(1))]),
        ScriptedOracle::new([]),
        scripted_options(),
    );

    assert_eq!(search.solve(), Err(MaxSatError::SoftWeightOverflow));
    assert!(search.oracle().clauses.is_empty());
    assert!(search.oracle().calls.is_empty());
}

#[test]
fn soft_weights_summing_to_u64_max_are_solved() {
    let solution = solve(formula([
        (vec![1], Some(u64::MAX - 2)),
        (vec![-1, 2], Some(1)),
        (vec![-2], Some(1)),
    ]))
    .expect("feasible");

    assert_eq!(solution.cost(), 1);
    assert!(solution.value(variable(1)));
}

#[test]
fn formula_without_soft_clauses_has_cost_zero() {
    let solution = solve(formula([(vec![1, 2], None), (vec![-1], None)])).expect("feasible");

    assert_eq!(solution.cost(), 0);
    assert!(!solution.value(variable(1)));
    assert!(solution.value(variable(2)));
}

#[test]
fn violated_soft_clause_costs_its_weight() {
    let solution = solve(formula([(vec![1], Some(5)), (vec![-1], None)])).expect("feasible");

    assert_eq!(solution.cost(), 5);
    assert!(!solution.value(variable(1)));
}

#[test]
fn cheaper_soft_clause_is_violated() {
    let solution =
        solve(formula([(vec![1], Some(3)), (vec![-1], Some(7))])).expect("feasible");

    assert_eq!(solution.cost(), 3);
    assert!(!solution.value(variable(1)));
}

#[test]
fn infeasible_hard_clauses_are_reported() {
    let result = solve(formula([(vec![1], None), (vec![-1], None), (vec![1], Some(2))]));

    assert_eq!(result, Err(MaxSatError::HardClausesUnsatisfiable));
}

#[test]
fn empty_soft_clause_is_always_violated() {
    let solution = solve(formula([
        (vec![], Some(4)),
        (vec![1], Some(2)),
        (vec![-1], None),
    ]))
    .expect("feasible");

    assert_eq!(solution.cost(), 6);
}

#[test]
fn tautological_soft_clause_is_always_satisfied() {
    let solution = solve(formula([(vec![1, -1], Some(9)), (vec![-1], None)])).expect("feasible");

    assert_eq!(solution.cost(), 0);
}

#[test]
fn unit_soft_clauses_over_the_same_literal_are_merged() {
    let solution = solve(formula([
        (vec![1], Some(2)),
        (vec![1], Some(3)),
        (vec![-1], Some(4)),
    ]))
    .expect("feasible");

    assert_eq!(solution.cost(), 4);
    assert!(solution.value(variable(1)));
}

#[test]
fn at_most_one_of_many_soft_clauses_is_satisfiable() {
    let mut clauses: Vec<(Vec<i32>, Option<u64>)> =
        (1..=5).map(|index| (vec![index], Some(1))).collect();
    for first in 1..=5 {
        for second in first + 1..=5 {
            clauses.push((vec![-first, -second], None));
        }
    }
    for options in option_variants() {
        let (result, _) = solve_with(formula(clauses.clone()), options);
        assert_eq!(result.expect("feasible").cost(), 4, "{options:?}");
    }
}

#[test]
fn stratification_does_not_change_the_optimum() {
    // Every pair of neighbouring variables conflicts.
    let mut tied = vec![];
    let mut varied = vec![];
    for index in 1..=8 {
        tied.push((vec![index], Some(2)));
        varied.push((vec![index], Some(if index % 2 == 0 { 1 } else { 3 })));
        if index < 8 {
            tied.push((vec![-index, -(index + 1)], None));
            varied.push((vec![-index, -(index + 1)], None));
        }
    }
    for stratification in [false, true] {
        let options = CoreGuidedOptions {
            stratification,
            ..CoreGuidedOptions::default()
        };

        let (tied_result, _) = solve_with(formula(tied.clone()), options);
        let (varied_result, _) = solve_with(formula(varied.clone()), options);

        // Four of the eight variables can be true, at alternating positions.
        assert_eq!(tied_result.expect("feasible").cost(), 8);
        assert_eq!(varied_result.expect("feasible").cost(), 4);
    }
}

fn option_variants() -> Vec<CoreGuidedOptions> {
    let default = CoreGuidedOptions::default();
    vec![
        default,
        CoreGuidedOptions {
            stratification: false,
            ..default
        },
        CoreGuidedOptions {
            exhaustion: false,
            ..default
        },
        CoreGuidedOptions {
            core_extension: false,
            ..default
        },
        CoreGuidedOptions {
            hardening: false,
            ..default
        },
        CoreGuidedOptions {
            core_minimisation: CoreMinimisation::None,
            ..default
        },
        CoreGuidedOptions {
            core_minimisation: CoreMinimisation::Reduce,
            ..default
        },
        CoreGuidedOptions {
            core_minimisation: CoreMinimisation::TrimAndReduce,
            minimisation_budget: 10,
            ..default
        },
    ]
}

fn random_formula(random: &mut SmallRng) -> Formula {
    let num_variables = random.gen_range(3..=8);
    let random_clause = |random: &mut SmallRng, max_length: usize| {
        let length = random.gen_range(1..=max_length);
        (0..length)
            .map(|_| {
                let index = random.gen_range(1..=num_variables);
                if random.gen_bool(0.5) {
                    index
                } else {
                    -index
                }
            })
            .collect::<Vec<i32>>()
    };

    let mut clauses = vec![];
    for _ in 0..random.gen_range(0..=num_variables) {
        let literals = random_clause(random, 3);
        clauses.push((clause(&literals), None));
    }
    for _ in 0..random.gen_range(1..=2 * num_variables) {
        let literals = random_clause(random, 3);
        let weight = [1, 1, 2, 3, 5, 8][random.gen_range(0..6)];
        clauses.push((clause(&literals), Some(weight)));
    }

    let mut formula = Formula::with_num_variables(num_variables as u32);
    for (literals, weight) in clauses {
        match weight {
            Some(weight) => {
                let _ = formula.push_soft_clause(literals, weight);
            }
            None => formula.push_hard_clause(literals),
        }
    }
    formula
}

/// The optimal cost over all assignments, or [`None`] when the hard clauses are unsatisfiable.
fn brute_force_optimum(formula: &Formula) -> Option<u64> {
    let num_variables = formula.num_variables();
    (0u32..(1 << num_variables))
        .map(|mask| {
            let values = (0..num_variables)
                .map(|bit| mask & (1 << bit) != 0)
                .collect::<Vec<_>>();
            model(&values)
        })
        .filter(|model| formula.satisfies_hard_clauses(model))
        .map(|model| formula.cost_of(&model))
        .min()
}

#[test]
fn random_formulas_are_solved_to_optimality() {
    let mut random = SmallRng::seed_from_u64(42);

    for _ in 0..40 {
        let formula = random_formula(&mut random);
        let optimum = brute_force_optimum(&formula);

        for options in option_variants() {
            let (result, lower_bounds) = solve_with(formula.clone(), options);

            let Some(optimum) = optimum else {
                assert_eq!(result, Err(MaxSatError::HardClausesUnsatisfiable));
                continue;
            };
            let solution = result.expect("the hard clauses are satisfiable");
            let assignment = model(
                &solution
                    .literals()
                    .map(|literal| literal.is_positive())
                    .collect::<Vec<_>>(),
            );

            assert_eq!(solution.cost(), optimum, "{options:?}");
            assert!(formula.satisfies_hard_clauses(&assignment));
            assert_eq!(formula.cost_of(&assignment), optimum);

            // The lower bound only grows and ends at the optimum.
            assert!(lower_bounds.windows(2).all(|pair| pair[0] <= pair[1]));
            assert_eq!(lower_bounds.last(), Some(&optimum));
        }
    }
}

#[test]
fn the_lower_bound_reaches_the_optimum_without_hardening() {
    let mut random = SmallRng::seed_from_u64(7);
    let options = CoreGuidedOptions {
        hardening: false,
        ..CoreGuidedOptions::default()
    };

    for _ in 0..20 {
        let formula = random_formula(&mut random);
        let Some(optimum) = brute_force_optimum(&formula) else {
            continue;
        };

        let mut search = CoreGuidedSearch::new(formula, ClausalSolver::default(), options);
        let solution = search.solve().expect("feasible");

        assert_eq!(solution.cost(), optimum);
        assert_eq!(search.lower_bound(), optimum);
        assert_eq!(
            search.formula().soft_clauses().count(),
            search.formula().num_soft_clauses()
        );
    }
}

#[test]
fn solving_adds_no_clauses_which_exclude_optimal_models() {
    // The oracle still admits the optimal model after the search.
    let mut search = CoreGuidedSearch::new(
        formula([(vec![1, 2], Some(2)), (vec![-1], Some(1)), (vec![-2], Some(1))]),
        ClausalSolver::default(),
        CoreGuidedOptions::default(),
    );
    let solution = search.solve().expect("feasible");
    assert_eq!(solution.cost(), 1);

    let mut oracle = search.oracle;
    let assumptions = solution.literals().collect::<Vec<_>>();
    assert!(matches!(
        oracle.solve_under_assumptions(&assumptions, None),
        OracleResult::Satisfiable(_)
    ));
}
