//! Core-guided search for weighted partial MaxSAT.
//!
//! The search keeps a reformulated objective of weighted relaxation literals and repeatedly asks
//! the oracle whether the formula is satisfiable when none of them is violated. Every core which
//! the oracle returns raises the lower bound by its minimum weight and is relaxed with a sum over
//! its relaxation literals; the first model found at the lowest stratification level is optimal.
mod core_minimisation;
mod core_processing;

use log::debug;
use log::info;

use super::objective::Objective;
use super::objective::Sum;
use super::objective::SumId;
use super::objective::TermKind;
use super::stratification::Stratification;
use super::CoreGuidedOptions;
use super::MaxSatError;
use crate::basic_types::HashMap;
use crate::basic_types::HashSet;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::basic_types::Stopwatch;
use crate::containers::KeyedVec;
use crate::engine::Model;
use crate::engine::OracleProtocolError;
use crate::engine::OracleResult;
use crate::engine::SatOracle;
use crate::engine::VariableAllocator;
use crate::formula::Formula;
use crate::formula::SoftClauseId;
use crate::pumpkin_assert_eq_moderate;
use crate::pumpkin_assert_moderate;
use crate::pumpkin_assert_simple;
use crate::results::MaxSatSolution;
use crate::statistics::log_statistic;

/// Soft clauses with the same relaxation literal whose tier has not been assumed yet; their
/// relaxation literal is created when the tier is first assumed.
#[derive(Debug, Clone)]
struct PendingSoftClauses {
    soft_clauses: Vec<SoftClauseId>,
    literals: Vec<Literal>,
    weight: u64,
}

#[derive(Debug)]
enum SearchState {
    Searching,
    /// The lower bound has met the cost of the given model.
    Done(Model),
}

/// A validated answer of the oracle.
#[derive(Debug)]
enum OracleAnswer {
    Satisfiable(Model),
    Core(Vec<Literal>),
    /// Only possible when the call had a conflict budget.
    Unknown,
}

#[derive(Debug, Default, Clone, Copy)]
struct SearchStatistics {
    num_oracle_calls: u64,
    num_cores: u64,
    num_unit_cores: u64,
    sum_of_core_sizes: u64,
    num_literals_removed_by_minimisation: u64,
    num_sums: u64,
    num_sum_extensions: u64,
    num_exhaustion_rounds: u64,
    num_hardened_terms: u64,
    num_stratification_levels: u64,
}

/// Solves a [`Formula`] to optimality with a [`SatOracle`].
///
/// The oracle is expected to be fresh; the search adds the hard clauses of the formula to it.
/// Every answer of the oracle is checked against the contract of [`SatOracle`].
#[derive(Debug)]
pub struct CoreGuidedSearch<Oracle> {
    formula: Formula,
    oracle: Oracle,
    allocator: VariableAllocator,
    options: CoreGuidedOptions,
    objective: Objective,
    sums: KeyedVec<SumId, Sum>,
    stratification: Stratification,
    pending: Vec<PendingSoftClauses>,
    lower_bound: u64,
    /// Every value the lower bound took, starting with the initial one.
    lower_bound_history: Vec<u64>,
    upper_bound: u64,
    best_model: Option<Model>,
    stopwatch: Stopwatch,
    statistics: SearchStatistics,
}

impl<Oracle: SatOracle> CoreGuidedSearch<Oracle> {
    pub fn new(formula: Formula, oracle: Oracle, options: CoreGuidedOptions) -> Self {
        let allocator = VariableAllocator::new(formula.num_variables());
        CoreGuidedSearch {
            formula,
            oracle,
            allocator,
            options,
            objective: Objective::default(),
            sums: KeyedVec::default(),
            stratification: Stratification::disabled(),
            pending: vec![],
            lower_bound: 0,
            lower_bound_history: vec![],
            upper_bound: u64::MAX,
            best_model: None,
            stopwatch: Stopwatch::starting_now(),
            statistics: SearchStatistics::default(),
        }
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    pub fn lower_bound(&self) -> u64 {
        self.lower_bound
    }

    /// Searches for an optimal solution; may only be called once.
    pub fn solve(&mut self) -> Result<MaxSatSolution, MaxSatError> {
        pumpkin_assert_simple!(
            self.lower_bound_history.is_empty(),
            "A core-guided search can only be run once."
        );

        self.initialise()?;
        let model = loop {
            match self.step()? {
                SearchState::Searching => {}
                SearchState::Done(model) => break model,
            }
        };

        pumpkin_assert_eq_moderate!(self.formula.cost_of(&model), self.upper_bound);
        pumpkin_assert_moderate!(self.formula.satisfies_hard_clauses(&model));

        info!(
            "Optimal cost {} found after {} seconds ({} ms)",
            self.upper_bound,
            self.stopwatch.elapsed().as_secs(),
            self.stopwatch.elapsed().as_millis(),
        );
        Ok(MaxSatSolution::new(
            self.upper_bound,
            &model,
            self.formula.num_variables(),
        ))
    }

    pub fn log_statistics(&self) {
        let statistics = &self.statistics;
        log_statistic("numberOfOracleCalls", statistics.num_oracle_calls);
        log_statistic("numberOfCores", statistics.num_cores);
        log_statistic("numberOfUnitCores", statistics.num_unit_cores);
        let average_core_size = if statistics.num_cores == 0 {
            0.0
        } else {
            statistics.sum_of_core_sizes as f64 / statistics.num_cores as f64
        };
        log_statistic("averageCoreSize", average_core_size);
        log_statistic(
            "numberOfLiteralsRemovedByMinimisation",
            statistics.num_literals_removed_by_minimisation,
        );
        log_statistic("numberOfSums", statistics.num_sums);
        log_statistic("numberOfSumExtensions", statistics.num_sum_extensions);
        log_statistic("numberOfExhaustionRounds", statistics.num_exhaustion_rounds);
        log_statistic("numberOfHardenedTerms", statistics.num_hardened_terms);
        log_statistic(
            "numberOfStratificationLevels",
            statistics.num_stratification_levels,
        );
        log_statistic("numberOfObjectiveTerms", self.objective.num_terms());
        log_statistic(
            "numberOfAuxiliaryVariables",
            self.allocator.num_auxiliary_variables(),
        );
        log_statistic("lowerBound", self.lower_bound);
        log_statistic("residualObjectiveWeight", self.objective.total_live_weight());
        self.oracle.log_statistics();
    }

    /// Adds the hard clauses to the oracle, groups the soft clauses and assumes the first tier.
    fn initialise(&mut self) -> Result<(), MaxSatError> {
        // Bounds and residual weights never exceed the total soft weight.
        let _ = self
            .formula
            .total_soft_weight()
            .ok_or(MaxSatError::SoftWeightOverflow)?;

        self.oracle
            .accommodate_variable(PropositionalVariable::new(self.formula.num_variables()));
        for clause in self.formula.hard_clauses() {
            self.oracle
                .add_clause(clause)
                .map_err(|_| MaxSatError::HardClausesUnsatisfiable)?;
        }

        let mut unit_groups: HashMap<Literal, usize> = HashMap::default();
        for (id, soft_clause) in self.formula.soft_clauses() {
            let mut literals = soft_clause.literals().to_vec();
            literals.sort();
            literals.dedup();

            // Sorting places a literal next to its negation.
            if literals.windows(2).any(|pair| pair[0] == !pair[1]) {
                debug!("Dropping tautological soft clause {id:?}");
                continue;
            }

            match literals.len() {
                0 => self.lower_bound += soft_clause.weight(),
                1 => {
                    if let Some(&group) = unit_groups.get(&literals[0]) {
                        self.pending[group].soft_clauses.push(id);
                        self.pending[group].weight += soft_clause.weight();
                    } else {
                        let _ = unit_groups.insert(literals[0], self.pending.len());
                        self.pending.push(PendingSoftClauses {
                            soft_clauses: vec![id],
                            literals,
                            weight: soft_clause.weight(),
                        });
                    }
                }
                _ => self.pending.push(PendingSoftClauses {
                    soft_clauses: vec![id],
                    literals,
                    weight: soft_clause.weight(),
                }),
            }
        }

        self.stratification = Stratification::new(
            self.pending.iter().map(|pending| pending.weight),
            self.options.stratification,
        );
        self.statistics.num_stratification_levels = self.stratification.num_levels() as u64;
        self.lower_bound_history.push(self.lower_bound);

        debug!(
            "Initialised with {} objective groups over {} levels and lower bound {}",
            self.pending.len(),
            self.stratification.num_levels(),
            self.lower_bound
        );
        self.activate_pending_soft_clauses()
    }

    fn step(&mut self) -> Result<SearchState, MaxSatError> {
        if let Some(model) = self.best_model.as_ref() {
            if self.lower_bound >= self.upper_bound {
                pumpkin_assert_eq_moderate!(self.lower_bound, self.upper_bound);
                return Ok(SearchState::Done(model.clone()));
            }
        }

        let stratification = &self.stratification;
        let assumptions = self
            .objective
            .assumptions(|weight| stratification.is_active(weight));

        match self.solve_under_assumptions(&assumptions, None)? {
            OracleAnswer::Satisfiable(model) => self.on_satisfiable(model),
            OracleAnswer::Core(core) => {
                self.process_core(core)?;
                Ok(SearchState::Searching)
            }
            OracleAnswer::Unknown => Err(OracleProtocolError::UnexpectedUnknown.into()),
        }
    }

    fn on_satisfiable(&mut self, model: Model) -> Result<SearchState, MaxSatError> {
        self.update_upper_bound(&model);

        if self.stratification.is_final_level() {
            pumpkin_assert_eq_moderate!(
                self.lower_bound,
                self.upper_bound,
                "A model at the final level has the cost of the lower bound."
            );
            return Ok(SearchState::Done(self.best_model.clone().unwrap_or(model)));
        }

        if self.options.hardening {
            self.harden_terms()?;
        }

        self.stratification.advance();
        debug!(
            "Lowering the stratification level to {}",
            self.stratification.active_level()
        );
        self.activate_pending_soft_clauses()?;
        Ok(SearchState::Searching)
    }

    /// Creates the relaxation literals of the soft clauses which are assumed at the active level.
    fn activate_pending_soft_clauses(&mut self) -> Result<(), MaxSatError> {
        let stratification = &self.stratification;
        let (activated, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|pending| stratification.is_active(pending.weight));
        self.pending = pending;

        for soft_clauses in activated {
            let relaxation_literal = if let [literal] = soft_clauses.literals.as_slice() {
                !*literal
            } else {
                let relaxation_literal = self.allocator.fresh_literal();
                let mut relaxed_clause = soft_clauses.literals.clone();
                relaxed_clause.push(relaxation_literal);
                self.add_clause(&relaxed_clause)?;
                relaxation_literal
            };

            let _ = self.objective.add_term(
                relaxation_literal,
                TermKind::SoftClauses(soft_clauses.soft_clauses),
                soft_clauses.weight,
            );
        }

        Ok(())
    }

    fn update_upper_bound(&mut self, model: &Model) {
        let cost = self.formula.cost_of(model);
        if self.best_model.is_none() || cost < self.upper_bound {
            self.upper_bound = cost;
            self.best_model = Some(model.clone());

            info!(
                "Current objective is {} after {} seconds ({} ms)",
                cost,
                self.stopwatch.elapsed().as_secs(),
                self.stopwatch.elapsed().as_millis(),
            );
        }
    }

    fn increase_lower_bound(&mut self, amount: u64) {
        self.lower_bound += amount;
        self.lower_bound_history.push(self.lower_bound);

        info!(
            "Lower bound is {} after {} seconds ({} ms)",
            self.lower_bound,
            self.stopwatch.elapsed().as_secs(),
            self.stopwatch.elapsed().as_millis(),
        );
    }

    /// Fixes every term (and every soft clause which is not assumed yet) which cannot be violated
    /// by a solution better than the best model.
    fn harden_terms(&mut self) -> Result<(), MaxSatError> {
        let lower_bound = self.lower_bound;
        let upper_bound = self.upper_bound;

        let terms_to_harden = self
            .objective
            .live_terms()
            .filter(|(_, term)| lower_bound.saturating_add(term.residual_weight) > upper_bound)
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        for term in terms_to_harden {
            let relaxation_literal = self.objective.harden(term);
            self.add_clause(&[!relaxation_literal])?;

            if let TermKind::SoftClauses(soft_clauses) = &self.objective.term(term).kind {
                for &soft_clause in soft_clauses {
                    self.formula.harden(soft_clause);
                }
            }
            self.statistics.num_hardened_terms += 1;
        }

        let (hardened, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|pending| lower_bound.saturating_add(pending.weight) > upper_bound);
        self.pending = pending;
        for soft_clauses in hardened {
            self.add_clause(&soft_clauses.literals)?;
            for soft_clause in soft_clauses.soft_clauses {
                self.formula.harden(soft_clause);
            }
            self.statistics.num_hardened_terms += 1;
        }

        Ok(())
    }

    fn add_clause(&mut self, literals: &[Literal]) -> Result<(), MaxSatError> {
        self.oracle
            .add_clause(literals)
            .map_err(|_| MaxSatError::HardClausesUnsatisfiable)
    }

    /// Calls the oracle and checks its answer; an [`OracleResult::Unsatisfiable`] answer means
    /// that the hard clauses cannot be satisfied.
    fn solve_under_assumptions(
        &mut self,
        assumptions: &[Literal],
        conflict_budget: Option<u64>,
    ) -> Result<OracleAnswer, MaxSatError> {
        let last_variable = self.allocator.last_variable();
        self.oracle.accommodate_variable(last_variable);
        self.statistics.num_oracle_calls += 1;

        match self
            .oracle
            .solve_under_assumptions(assumptions, conflict_budget)
        {
            OracleResult::Satisfiable(model) => {
                if !model.contains(last_variable) {
                    return Err(OracleProtocolError::IncompleteModel {
                        covered: model.num_variables(),
                        required: last_variable.get_index() as usize + 1,
                    }
                    .into());
                }
                Ok(OracleAnswer::Satisfiable(model))
            }
            OracleResult::UnsatisfiableUnderAssumptions(mut core) => {
                if core.is_empty() {
                    return Err(OracleProtocolError::EmptyCore.into());
                }

                let assumed = assumptions.iter().copied().collect::<HashSet<_>>();
                if let Some(&literal) = core.iter().find(|literal| !assumed.contains(literal)) {
                    return Err(OracleProtocolError::CoreLiteralNotAssumed(literal).into());
                }

                core.sort();
                core.dedup();
                Ok(OracleAnswer::Core(core))
            }
            OracleResult::Unsatisfiable => Err(MaxSatError::HardClausesUnsatisfiable),
            OracleResult::Unknown => {
                if conflict_budget.is_none() {
                    return Err(OracleProtocolError::UnexpectedUnknown.into());
                }
                Ok(OracleAnswer::Unknown)
            }
        }
    }
}

#[cfg(test)]
mod tests;
