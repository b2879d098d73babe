use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::sat::AssignmentsPropositional;
use super::sat::ClausalPropagator;
use super::sat::ClauseAllocator;
use super::sat::ClauseReference;
use super::sat::PropositionalValueSelector;
use super::sat::PropositionalVariableSelector;
use super::Model;
use super::OracleResult;
use super::SatOracle;
use crate::basic_types::sequence_generators::LubySequence;
use crate::basic_types::sequence_generators::SequenceGenerator;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyedVec;
use crate::pumpkin_assert_moderate;
use crate::pumpkin_assert_simple;
use crate::statistics::log_statistic;

/// Options of the [`ClausalSolver`].
#[derive(Debug, Clone, Copy)]
pub struct SatOptions {
    /// Whether restarts are performed at all.
    pub restarts_enabled: bool,
    /// The number of conflicts before the first restart; later intervals follow the Luby
    /// sequence scaled by this value.
    pub restart_base_interval: u64,
    /// The number of learned clauses which triggers the first clause database reduction.
    pub learned_clause_limit: usize,
    /// The seed used to break ties in the initial variable order.
    pub random_seed: u64,
}

impl Default for SatOptions {
    fn default() -> Self {
        SatOptions {
            restarts_enabled: true,
            restart_base_interval: 50,
            learned_clause_limit: 4000,
            random_seed: 42,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SolverStatistics {
    num_solve_calls: u64,
    num_decisions: u64,
    num_conflicts: u64,
    num_restarts: u64,
    num_learned_clauses: u64,
    num_deleted_clauses: u64,
    num_unit_learned_clauses: u64,
    average_learned_clause_length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SolverState {
    Ready,
    /// The root level is conflicting; every later call is unsatisfiable.
    Infeasible,
}

/// The result of analysing a conflict with the first unique implication point scheme.
#[derive(Debug)]
struct ConflictAnalysisResult {
    /// The learned clause; the asserting literal is at position zero and the literal with the
    /// highest decision level among the rest is at position one.
    learned_literals: Vec<Literal>,
    backjump_level: usize,
}

/// A conflict-driven clause learning SAT solver which implements [`SatOracle`].
///
/// Assumptions are decided one per decision level (level `i + 1` holds assumption `i`); when an
/// assumption is found false, the assumptions responsible for that are extracted by walking the
/// implication graph backwards from it.
#[derive(Debug)]
pub struct ClausalSolver {
    assignments: AssignmentsPropositional,
    clause_allocator: ClauseAllocator,
    clausal_propagator: ClausalPropagator,
    variable_selector: PropositionalVariableSelector,
    value_selector: PropositionalValueSelector,
    learned_clauses: Vec<ClauseReference>,
    learned_clause_limit: usize,
    seen: KeyedVec<PropositionalVariable, bool>,
    luby_sequence: LubySequence,
    conflicts_until_restart: u64,
    state: SolverState,
    random: SmallRng,
    options: SatOptions,
    statistics: SolverStatistics,
}

impl Default for ClausalSolver {
    fn default() -> Self {
        ClausalSolver::new(SatOptions::default())
    }
}

impl ClausalSolver {
    pub fn new(options: SatOptions) -> ClausalSolver {
        let mut luby_sequence = LubySequence::new(options.restart_base_interval);
        let conflicts_until_restart = luby_sequence.next();

        let mut solver = ClausalSolver {
            assignments: AssignmentsPropositional::default(),
            clause_allocator: ClauseAllocator::default(),
            clausal_propagator: ClausalPropagator::default(),
            variable_selector: PropositionalVariableSelector::default(),
            value_selector: PropositionalValueSelector::default(),
            learned_clauses: vec![],
            learned_clause_limit: options.learned_clause_limit,
            seen: KeyedVec::default(),
            luby_sequence,
            conflicts_until_restart,
            state: SolverState::Ready,
            random: SmallRng::seed_from_u64(options.random_seed),
            options,
            statistics: SolverStatistics::default(),
        };

        // Variable zero is fixed to true and never branched on.
        let true_variable = solver.create_variable();
        solver.variable_selector.remove(true_variable);
        solver
            .assignments
            .enqueue_root_literal(Literal::new(true_variable, true));

        solver
    }

    pub fn num_propositional_variables(&self) -> usize {
        self.assignments.num_propositional_variables()
    }

    pub fn num_clauses(&self) -> usize {
        self.clause_allocator.num_clauses()
    }

    fn create_variable(&mut self) -> PropositionalVariable {
        let variable = self.assignments.grow();
        self.clausal_propagator.grow();
        self.variable_selector.grow(variable, &mut self.random);
        self.value_selector.grow();
        let _ = self.seen.push(false);
        variable
    }

    fn backtrack(&mut self, decision_level: usize) {
        let variable_selector = &mut self.variable_selector;
        let value_selector = &mut self.value_selector;
        self.assignments.synchronise(decision_level, |literal| {
            value_selector.save_phase(literal);
            variable_selector.restore(literal.get_propositional_variable());
        });
        self.clausal_propagator
            .synchronise(self.assignments.trail().len());
    }

    fn propagate(&mut self) -> Result<(), ClauseReference> {
        self.clausal_propagator
            .propagate(&mut self.assignments, &mut self.clause_allocator)
    }

    /// Removes duplicate literals and literals which are false at the root. Returns [`None`] if
    /// the clause is satisfied at the root or contains a literal and its negation.
    fn preprocess_clause(&self, literals: &[Literal]) -> Option<Vec<Literal>> {
        let mut clause = literals.to_vec();
        clause.sort();
        clause.dedup();

        if clause
            .windows(2)
            .any(|pair| pair[0] == !pair[1])
            || clause
                .iter()
                .any(|&literal| self.assignments.is_literal_assigned_true(literal))
        {
            return None;
        }

        clause.retain(|&literal| !self.assignments.is_literal_assigned_false(literal));
        Some(clause)
    }

    fn analyse_conflict(&mut self, conflicting_clause: ClauseReference) -> ConflictAnalysisResult {
        let current_level = self.assignments.get_decision_level();
        pumpkin_assert_simple!(current_level > 0);

        // Position zero is reserved for the asserting literal.
        let mut learned_literals = vec![!self.assignments.trail()[0]];
        let mut num_current_level_literals = 0;
        let mut trail_position = self.assignments.trail().len();
        let mut clause_reference = conflicting_clause;
        let mut skip_first = false;

        loop {
            let clause = &self.clause_allocator[clause_reference];
            let start = usize::from(skip_first);
            for &literal in &clause.get_literal_slice()[start..] {
                let variable = literal.get_propositional_variable();
                let level = self.assignments.get_variable_assignment_level(variable);
                if self.seen[variable] || level == 0 {
                    continue;
                }

                self.seen[variable] = true;
                self.variable_selector.bump_activity(variable);
                if level == current_level {
                    num_current_level_literals += 1;
                } else {
                    learned_literals.push(literal);
                }
            }

            let next_literal = loop {
                trail_position -= 1;
                let literal = self.assignments.trail()[trail_position];
                if self.seen[literal.get_propositional_variable()] {
                    break literal;
                }
            };
            self.seen[next_literal.get_propositional_variable()] = false;
            num_current_level_literals -= 1;

            if num_current_level_literals == 0 {
                learned_literals[0] = !next_literal;
                break;
            }

            match self
                .assignments
                .get_variable_reason(next_literal.get_propositional_variable())
            {
                Some(reason) => {
                    clause_reference = reason;
                    skip_first = true;
                }
                None => unreachable!("only the last literal of a level can be a decision"),
            }
        }

        for literal in &learned_literals[1..] {
            self.seen[literal.get_propositional_variable()] = false;
        }

        let backjump_level = if learned_literals.len() > 1 {
            let position_of_highest = (1..learned_literals.len())
                .max_by_key(|&index| {
                    self.assignments
                        .get_literal_assignment_level(learned_literals[index])
                })
                .unwrap_or(1);
            learned_literals.swap(1, position_of_highest);
            self.assignments
                .get_literal_assignment_level(learned_literals[1])
        } else {
            0
        };

        ConflictAnalysisResult {
            learned_literals,
            backjump_level,
        }
    }

    fn compute_lbd(&self, literals: &[Literal]) -> u32 {
        let mut levels = literals
            .iter()
            .map(|&literal| self.assignments.get_literal_assignment_level(literal))
            .collect::<Vec<_>>();
        levels.sort_unstable();
        levels.dedup();
        levels.len() as u32
    }

    fn learn_clause(&mut self, analysis_result: ConflictAnalysisResult) {
        let ConflictAnalysisResult {
            learned_literals,
            backjump_level,
        } = analysis_result;

        self.statistics.num_learned_clauses += 1;
        self.statistics.average_learned_clause_length += (learned_literals.len() as f64
            - self.statistics.average_learned_clause_length)
            / self.statistics.num_learned_clauses as f64;

        let lbd = self.compute_lbd(&learned_literals);
        self.backtrack(backjump_level);

        let asserting_literal = learned_literals[0];
        if learned_literals.len() == 1 {
            pumpkin_assert_simple!(self.assignments.is_at_the_root_level());
            self.statistics.num_unit_learned_clauses += 1;
            self.assignments.enqueue_root_literal(asserting_literal);
        } else {
            let clause_reference = self.clause_allocator.create_clause(learned_literals, true);
            self.clause_allocator[clause_reference].set_lbd(lbd);
            self.clausal_propagator
                .start_watching_clause(&self.clause_allocator[clause_reference], clause_reference);
            self.learned_clauses.push(clause_reference);
            self.assignments
                .enqueue_propagated_literal(asserting_literal, clause_reference);
        }
    }

    /// Collects the assumptions which imply that `failed_assumption` is false.
    fn extract_core(&mut self, failed_assumption: Literal) -> Vec<Literal> {
        let mut core = vec![failed_assumption];
        let failed_variable = failed_assumption.get_propositional_variable();
        if self.assignments.get_variable_assignment_level(failed_variable) == 0 {
            return core;
        }

        self.seen[failed_variable] = true;
        let root_trail_length = self.assignments.root_trail_length();
        for position in (root_trail_length..self.assignments.trail().len()).rev() {
            let literal = self.assignments.trail()[position];
            let variable = literal.get_propositional_variable();
            if !self.seen[variable] {
                continue;
            }
            self.seen[variable] = false;

            match self.assignments.get_variable_reason(variable) {
                // While assumptions are being decided, every decision is an assumption. This
                // includes the negation of the failed assumption if both were assumed.
                None => core.push(literal),
                Some(reason) => {
                    for &antecedent in &self.clause_allocator[reason].get_literal_slice()[1..] {
                        let antecedent_variable = antecedent.get_propositional_variable();
                        if self
                            .assignments
                            .get_variable_assignment_level(antecedent_variable)
                            > 0
                        {
                            self.seen[antecedent_variable] = true;
                        }
                    }
                }
            }
        }

        core
    }

    fn extract_model(&self) -> Model {
        Model::new(
            (0..self.assignments.num_propositional_variables()).map(|index| {
                self.assignments
                    .get_variable_value(PropositionalVariable::new(index as u32))
                    .unwrap_or(false)
            }),
        )
    }

    fn should_restart(&self, conflicts_since_restart: u64) -> bool {
        self.options.restarts_enabled && conflicts_since_restart >= self.conflicts_until_restart
    }

    fn restart(&mut self) {
        self.statistics.num_restarts += 1;
        self.conflicts_until_restart = self.luby_sequence.next();
        self.backtrack(0);

        if self.learned_clauses.len() > self.learned_clause_limit {
            self.reduce_learned_clauses();
        }
    }

    /// Deletes the half of the learned clauses with the highest literal block distance; clauses
    /// with a distance of at most two and clauses which are the reason for an assignment are
    /// kept.
    fn reduce_learned_clauses(&mut self) {
        let clause_allocator = &self.clause_allocator;
        self.learned_clauses
            .sort_by_key(|&reference| std::cmp::Reverse(clause_allocator[reference].get_lbd()));

        let num_to_delete = self.learned_clauses.len() / 2;
        let mut kept = Vec::with_capacity(self.learned_clauses.len());
        let mut num_deleted = 0;
        for &clause_reference in &self.learned_clauses {
            let clause = &self.clause_allocator[clause_reference];
            let is_locked = self
                .assignments
                .get_variable_reason(clause[0].get_propositional_variable())
                == Some(clause_reference);
            if num_deleted >= num_to_delete || clause.get_lbd() <= 2 || is_locked {
                kept.push(clause_reference);
                continue;
            }

            self.clausal_propagator
                .remove_clause_consideration(clause, clause_reference);
            self.clause_allocator.delete_clause(clause_reference);
            num_deleted += 1;
        }

        debug!(
            "Removed {num_deleted} learned clauses, {} remain",
            kept.len()
        );
        self.statistics.num_deleted_clauses += num_deleted as u64;
        self.learned_clauses = kept;
        self.learned_clause_limit += self.learned_clause_limit / 10;
    }

    fn declare_infeasible(&mut self) -> OracleResult {
        self.state = SolverState::Infeasible;
        self.backtrack(0);
        OracleResult::Unsatisfiable
    }
}

impl SatOracle for ClausalSolver {
    fn accommodate_variable(&mut self, variable: PropositionalVariable) {
        while self.assignments.num_propositional_variables() <= variable.get_index() as usize {
            let _ = self.create_variable();
        }
    }

    fn add_clause(&mut self, literals: &[Literal]) -> Result<(), ConstraintOperationError> {
        if self.state == SolverState::Infeasible {
            return Err(ConstraintOperationError::InfeasibleState);
        }
        pumpkin_assert_simple!(self.assignments.is_at_the_root_level());

        for literal in literals {
            self.accommodate_variable(literal.get_propositional_variable());
        }

        let Some(clause) = self.preprocess_clause(literals) else {
            return Ok(());
        };

        match clause.len() {
            0 => {
                self.state = SolverState::Infeasible;
                Err(ConstraintOperationError::InfeasibleClause)
            }
            1 => {
                self.assignments.enqueue_root_literal(clause[0]);
                if self.propagate().is_err() {
                    self.state = SolverState::Infeasible;
                    return Err(ConstraintOperationError::InfeasibleClause);
                }
                Ok(())
            }
            _ => {
                let clause_reference = self.clause_allocator.create_clause(clause, false);
                self.clausal_propagator
                    .start_watching_clause(&self.clause_allocator[clause_reference], clause_reference);
                Ok(())
            }
        }
    }

    fn solve_under_assumptions(
        &mut self,
        assumptions: &[Literal],
        conflict_budget: Option<u64>,
    ) -> OracleResult {
        self.statistics.num_solve_calls += 1;
        if self.state == SolverState::Infeasible {
            return OracleResult::Unsatisfiable;
        }
        for assumption in assumptions {
            self.accommodate_variable(assumption.get_propositional_variable());
        }

        let mut num_conflicts = 0;
        let mut conflicts_since_restart = 0;
        loop {
            if let Err(conflicting_clause) = self.propagate() {
                if self.assignments.is_at_the_root_level() {
                    return self.declare_infeasible();
                }

                self.statistics.num_conflicts += 1;
                num_conflicts += 1;
                conflicts_since_restart += 1;

                let analysis_result = self.analyse_conflict(conflicting_clause);
                self.learn_clause(analysis_result);
                self.variable_selector.decay_activities();

                if conflict_budget.is_some_and(|budget| num_conflicts >= budget) {
                    self.backtrack(0);
                    return OracleResult::Unknown;
                }
                if self.should_restart(conflicts_since_restart) {
                    conflicts_since_restart = 0;
                    self.restart();
                }
                continue;
            }

            let decision_level = self.assignments.get_decision_level();
            if decision_level < assumptions.len() {
                let assumption = assumptions[decision_level];
                if self.assignments.is_literal_assigned_false(assumption) {
                    let core = self.extract_core(assumption);
                    self.backtrack(0);
                    return OracleResult::UnsatisfiableUnderAssumptions(core);
                }

                self.assignments.increase_decision_level();
                if self.assignments.is_literal_unassigned(assumption) {
                    self.assignments.enqueue_decision_literal(assumption);
                }
                continue;
            }

            match self.variable_selector.next_variable(&self.assignments) {
                Some(variable) => {
                    self.statistics.num_decisions += 1;
                    let decision = self.value_selector.select_literal(variable);
                    self.assignments.increase_decision_level();
                    self.assignments.enqueue_decision_literal(decision);
                }
                None => {
                    pumpkin_assert_moderate!(
                        self.assignments.trail().len()
                            == self.assignments.num_propositional_variables()
                    );
                    let model = self.extract_model();
                    self.backtrack(0);
                    return OracleResult::Satisfiable(model);
                }
            }
        }
    }

    fn log_statistics(&self) {
        log_statistic("numberOfSolveCalls", self.statistics.num_solve_calls);
        log_statistic("numberOfDecisions", self.statistics.num_decisions);
        log_statistic("numberOfConflicts", self.statistics.num_conflicts);
        log_statistic("numberOfRestarts", self.statistics.num_restarts);
        log_statistic("numberOfLearnedClauses", self.statistics.num_learned_clauses);
        log_statistic(
            "numberOfLearnedUnitClauses",
            self.statistics.num_unit_learned_clauses,
        );
        log_statistic("numberOfDeletedClauses", self.statistics.num_deleted_clauses);
        log_statistic(
            "averageLearnedClauseLength",
            self.statistics.average_learned_clause_length,
        );
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroI32;

    use super::ClausalSolver;
    use crate::basic_types::Literal;
    use crate::engine::OracleResult;
    use crate::engine::SatOracle;

    fn lit(dimacs: i32) -> Literal {
        Literal::from_dimacs(NonZeroI32::new(dimacs).unwrap())
    }

    fn add_clauses(solver: &mut ClausalSolver, clauses: &[&[i32]]) {
        for clause in clauses {
            let literals = clause.iter().map(|&dimacs| lit(dimacs)).collect::<Vec<_>>();
            let _ = solver.add_clause(&literals);
        }
    }

    /// The pigeonhole principle with `holes + 1` pigeons; variable `p * holes + h + 1` states
    /// that pigeon `p` sits in hole `h`.
    fn pigeonhole(holes: i32) -> Vec<Vec<i32>> {
        let var = |pigeon: i32, hole: i32| pigeon * holes + hole + 1;
        let mut clauses = vec![];
        for pigeon in 0..=holes {
            clauses.push((0..holes).map(|hole| var(pigeon, hole)).collect());
        }
        for hole in 0..holes {
            for first in 0..=holes {
                for second in first + 1..=holes {
                    clauses.push(vec![-var(first, hole), -var(second, hole)]);
                }
            }
        }
        clauses
    }

    #[test]
    fn satisfiable_formula_yields_a_model_of_all_clauses() {
        let clauses: &[&[i32]] = &[&[1, 2, 3], &[-1, -2], &[-2, -3], &[-1, -3], &[-1, 2, 4], &[-4]];
        let mut solver = ClausalSolver::default();
        add_clauses(&mut solver, clauses);

        let OracleResult::Satisfiable(model) = solver.solve_under_assumptions(&[], None) else {
            panic!("the formula is satisfiable");
        };
        for clause in clauses {
            assert!(clause.iter().any(|&dimacs| model.is_true(lit(dimacs))));
        }
    }

    #[test]
    fn pigeonhole_is_unsatisfiable() {
        let mut solver = ClausalSolver::default();
        for clause in pigeonhole(5) {
            let literals = clause.iter().map(|&dimacs| lit(dimacs)).collect::<Vec<_>>();
            let _ = solver.add_clause(&literals);
        }

        assert_eq!(
            solver.solve_under_assumptions(&[], None),
            OracleResult::Unsatisfiable
        );
        assert!(solver.add_clause(&[lit(1)]).is_err());
    }

    #[test]
    fn core_only_contains_responsible_assumptions() {
        let mut solver = ClausalSolver::default();
        add_clauses(&mut solver, &[&[-1, 3], &[-2, -3], &[5, 6]]);

        let result = solver.solve_under_assumptions(&[lit(4), lit(1), lit(-5), lit(2)], None);
        let OracleResult::UnsatisfiableUnderAssumptions(mut core) = result else {
            panic!("expected a core, got {result:?}");
        };
        core.sort();
        let mut expected = vec![lit(1), lit(2)];
        expected.sort();
        assert_eq!(core, expected);

        // The clauses are kept and the solver can be reused without assumptions.
        assert!(matches!(
            solver.solve_under_assumptions(&[lit(1)], None),
            OracleResult::Satisfiable(model) if model.is_true(lit(3)) && model.is_true(lit(-2))
        ));
    }

    #[test]
    fn root_falsified_assumption_is_a_core_by_itself() {
        let mut solver = ClausalSolver::default();
        add_clauses(&mut solver, &[&[-1]]);

        assert_eq!(
            solver.solve_under_assumptions(&[lit(2), lit(1)], None),
            OracleResult::UnsatisfiableUnderAssumptions(vec![lit(1)])
        );
    }

    #[test]
    fn conflicting_assumptions_form_a_core() {
        let mut solver = ClausalSolver::default();
        add_clauses(&mut solver, &[&[1, 2]]);

        let OracleResult::UnsatisfiableUnderAssumptions(mut core) =
            solver.solve_under_assumptions(&[lit(3), lit(-1), lit(1)], None)
        else {
            panic!("the assumptions contradict each other");
        };
        core.sort();
        let mut expected = vec![lit(1), lit(-1)];
        expected.sort();
        assert_eq!(core, expected);
    }

    #[test]
    fn hard_core_needs_search_under_assumptions() {
        // Assuming the selectors of the pigeonhole clauses; every clause is relaxed by a fresh
        // variable, so the core has to be found through conflict analysis.
        let clauses = pigeonhole(4);
        let first_selector = 100;
        let mut solver = ClausalSolver::default();
        let mut assumptions = vec![];
        for (index, clause) in clauses.iter().enumerate() {
            let selector = first_selector + index as i32;
            let mut literals = clause.iter().map(|&dimacs| lit(dimacs)).collect::<Vec<_>>();
            literals.push(lit(-selector));
            let _ = solver.add_clause(&literals);
            assumptions.push(lit(selector));
        }

        let OracleResult::UnsatisfiableUnderAssumptions(core) =
            solver.solve_under_assumptions(&assumptions, None)
        else {
            panic!("the assumptions make the formula unsatisfiable");
        };
        assert!(!core.is_empty());
        assert!(core.iter().all(|literal| assumptions.contains(literal)));

        // Dropping any assumption outside of the core keeps it unsatisfiable.
        assert!(matches!(
            solver.solve_under_assumptions(&core, None),
            OracleResult::UnsatisfiableUnderAssumptions(_)
        ));
    }

    #[test]
    fn exhausted_budget_gives_unknown() {
        let mut solver = ClausalSolver::default();
        for clause in pigeonhole(7) {
            let literals = clause.iter().map(|&dimacs| lit(dimacs)).collect::<Vec<_>>();
            let _ = solver.add_clause(&literals);
        }

        assert_eq!(
            solver.solve_under_assumptions(&[], Some(1)),
            OracleResult::Unknown
        );
    }
}
