//! Turning cores into sums: weight splitting, sum creation with exhaustion, raising the bounds of
//! sums whose outputs occur in a core, and extending a sum by the soft clauses of a core.
use log::debug;

use super::CoreGuidedSearch;
use super::OracleAnswer;
use crate::basic_types::Literal;
use crate::encoders::IncrementalTotaliser;
use crate::engine::OracleProtocolError;
use crate::engine::SatOracle;
use crate::optimisation::objective::Sum;
use crate::optimisation::objective::SumId;
use crate::optimisation::objective::TermId;
use crate::optimisation::objective::TermKind;
use crate::optimisation::MaxSatError;
use crate::pumpkin_assert_eq_simple;
use crate::pumpkin_assert_simple;

impl<Oracle: SatOracle> CoreGuidedSearch<Oracle> {
    /// Processes a core of assumptions of live objective terms.
    ///
    /// The lower bound increases by the minimum residual weight in the core, which is subtracted
    /// from every member. A unit core fixes its relaxation literal; any other core is relaxed by
    /// a sum over the relaxation literals of its members, or added to an existing sum.
    pub(super) fn process_core(&mut self, core: Vec<Literal>) -> Result<(), MaxSatError> {
        let core = self.minimise_core(core)?;

        let mut members = core
            .iter()
            .filter_map(|&literal| self.objective.term_of_assumption(literal))
            .collect::<Vec<_>>();
        pumpkin_assert_eq_simple!(members.len(), core.len());

        // Only the multiset of weights matters, not the order in which the oracle returned the
        // core.
        members.sort_by_key(|&member| {
            let term = self.objective.term(member);
            (term.residual_weight, term.relaxation_literal)
        });
        members.dedup();

        let min_weight = self.objective.term(members[0]).residual_weight;
        self.statistics.num_cores += 1;
        self.statistics.sum_of_core_sizes += members.len() as u64;
        debug!(
            "Processing a core of size {} with minimum weight {min_weight}",
            members.len()
        );

        let extendable_sum = if members.len() > 1 {
            self.extendable_sum(&members, min_weight)
        } else {
            None
        };

        self.increase_lower_bound(min_weight);
        for &member in &members {
            let _ = self.objective.decrease_weight(member, min_weight);
        }

        if let [member] = members[..] {
            self.process_unit_core(member)
        } else if let Some(sum) = extendable_sum {
            self.extend_sum(sum, &members)
        } else {
            for &member in &members {
                if let Some((sum, bound)) = self.sum_output_of(member) {
                    self.sums[sum].is_nested = true;
                    self.raise_sum_bound(sum, bound + 1)?;
                }
            }

            let relaxation_literals = members
                .iter()
                .map(|&member| self.objective.term(member).relaxation_literal)
                .collect::<Vec<_>>();
            self.create_sum(&relaxation_literals, min_weight)
        }
    }

    /// The relaxation literal of a unit core is true in every solution.
    fn process_unit_core(&mut self, member: TermId) -> Result<(), MaxSatError> {
        self.statistics.num_unit_cores += 1;

        let relaxation_literal = self.objective.term(member).relaxation_literal;
        self.add_clause(&[relaxation_literal])?;

        if let Some((sum, bound)) = self.sum_output_of(member) {
            let entailed = &mut self.sums[sum].entailed;
            *entailed = (*entailed).max(bound + 1);
            self.raise_sum_bound(sum, bound + 1)?;
        }

        Ok(())
    }

    fn sum_output_of(&self, term: TermId) -> Option<(SumId, usize)> {
        match self.objective.term(term).kind {
            TermKind::SumOutput { sum, bound } => Some((sum, bound)),
            TermKind::SoftClauses(_) => None,
        }
    }

    /// A sum to which the soft clauses of the core can be added as inputs.
    ///
    /// This is the case when the core contains the active output of a sum which is not the input
    /// of another sum and for which the bound is entailed, and all other members are soft
    /// clauses with the weight of the sum. Adding the soft clauses then gives the same objective
    /// as nesting the sum in a new one.
    fn extendable_sum(&self, members: &[TermId], min_weight: u64) -> Option<SumId> {
        if !self.options.core_extension {
            return None;
        }

        let mut outputs = members
            .iter()
            .filter_map(|&member| self.sum_output_of(member));
        let (sum, bound) = outputs.next()?;
        if outputs.next().is_some() {
            return None;
        }

        let candidate = &self.sums[sum];
        let is_extendable = candidate.totaliser.bound() == bound
            && candidate.entailed == bound
            && !candidate.is_nested
            && candidate.weight == min_weight
            && members
                .iter()
                .all(|&member| self.objective.term(member).residual_weight == min_weight);

        is_extendable.then_some(sum)
    }

    fn extend_sum(&mut self, sum: SumId, members: &[TermId]) -> Result<(), MaxSatError> {
        let new_inputs = members
            .iter()
            .filter(|&&member| self.sum_output_of(member).is_none())
            .map(|&member| self.objective.term(member).relaxation_literal)
            .collect::<Vec<_>>();

        let bound = self.sums[sum].totaliser.bound();
        self.sums[sum]
            .totaliser
            .extend(&new_inputs, &mut self.oracle, &mut self.allocator)?;
        self.sums[sum].entailed = bound + 1;
        self.statistics.num_sum_extensions += 1;
        debug!(
            "Extended sum {sum:?} with {} inputs to {} inputs",
            new_inputs.len(),
            self.sums[sum].totaliser.num_inputs()
        );

        self.raise_sum_bound(sum, bound + 1)
    }

    /// Creates a sum over `inputs` with bound 1; at least one input is true.
    fn create_sum(&mut self, inputs: &[Literal], weight: u64) -> Result<(), MaxSatError> {
        let totaliser =
            IncrementalTotaliser::new(inputs, 1, &mut self.oracle, &mut self.allocator)?;
        let sum = self.sums.push(Sum::new(totaliser, weight));
        self.statistics.num_sums += 1;
        debug!(
            "Created sum {sum:?} over {} inputs with weight {weight}",
            inputs.len()
        );

        if self.options.exhaustion {
            self.exhaust_sum(sum)?;
        }
        self.activate_sum_output(sum);
        Ok(())
    }

    /// Raises the bound of the sum while the oracle proves that more inputs than the bound are
    /// true; every round increases the lower bound by the weight of the sum.
    fn exhaust_sum(&mut self, sum: SumId) -> Result<(), MaxSatError> {
        loop {
            let bound = self.sums[sum].totaliser.bound();
            let Some(output) = self.sums[sum].totaliser.at_most_literal(bound) else {
                return Ok(());
            };

            match self.solve_under_assumptions(&[!output], None)? {
                OracleAnswer::Core(_) => {
                    self.statistics.num_exhaustion_rounds += 1;
                    self.add_clause(&[output])?;
                    let weight = self.sums[sum].weight;
                    self.increase_lower_bound(weight);

                    self.sums[sum].entailed = bound + 1;
                    self.sums[sum].totaliser.increase_bound(
                        bound + 1,
                        &mut self.oracle,
                        &mut self.allocator,
                    )?;
                }
                OracleAnswer::Satisfiable(model) => {
                    self.update_upper_bound(&model);
                    return Ok(());
                }
                OracleAnswer::Unknown => return Err(OracleProtocolError::UnexpectedUnknown.into()),
            }
        }
    }

    /// Raises the bound of the sum to `bound` and activates the output for that bound, unless the
    /// sum already reached it.
    fn raise_sum_bound(&mut self, sum: SumId, bound: usize) -> Result<(), MaxSatError> {
        if bound <= self.sums[sum].totaliser.bound() {
            return Ok(());
        }

        self.sums[sum]
            .totaliser
            .increase_bound(bound, &mut self.oracle, &mut self.allocator)?;
        self.activate_sum_output(sum);
        Ok(())
    }

    /// Adds the output for the current bound of the sum to the objective.
    fn activate_sum_output(&mut self, sum: SumId) {
        let sum_data = &self.sums[sum];
        let bound = sum_data.totaliser.bound();

        match sum_data.totaliser.at_most_literal(bound) {
            Some(output) => {
                let _ = self.objective.add_term(
                    output,
                    TermKind::SumOutput { sum, bound },
                    sum_data.weight,
                );
            }
            None => {
                pumpkin_assert_simple!(sum_data.is_retired());
                debug!("Sum {sum:?} is retired at bound {bound}");
            }
        }
    }
}
