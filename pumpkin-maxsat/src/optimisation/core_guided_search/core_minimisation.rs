use log::debug;

use super::CoreGuidedSearch;
use super::OracleAnswer;
use crate::basic_types::Literal;
use crate::engine::SatOracle;
use crate::optimisation::MaxSatError;

impl<Oracle: SatOracle> CoreGuidedSearch<Oracle> {
    /// Shrinks the core according to the configured
    /// [`CoreMinimisation`](crate::optimisation::CoreMinimisation).
    pub(super) fn minimise_core(&mut self, core: Vec<Literal>) -> Result<Vec<Literal>, MaxSatError> {
        let original_size = core.len();

        let mut core = core;
        if self.options.core_minimisation.trims() {
            core = self.trim_core(core)?;
        }
        if self.options.core_minimisation.reduces() {
            core = self.reduce_core(core)?;
        }

        if core.len() < original_size {
            debug!("Minimised a core from {original_size} to {} literals", core.len());
            self.statistics.num_literals_removed_by_minimisation +=
                (original_size - core.len()) as u64;
        }
        Ok(core)
    }

    /// Solves under the core itself, which often gives a smaller core.
    fn trim_core(&mut self, mut core: Vec<Literal>) -> Result<Vec<Literal>, MaxSatError> {
        for _ in 0..self.options.trim_rounds {
            if core.len() <= 1 {
                break;
            }

            match self.solve_under_assumptions(&core, None)? {
                OracleAnswer::Core(trimmed) if trimmed.len() < core.len() => core = trimmed,
                OracleAnswer::Satisfiable(model) => {
                    self.update_upper_bound(&model);
                    break;
                }
                _ => break,
            }
        }

        Ok(core)
    }

    /// Tries to leave out each literal in turn; a literal stays out when the rest is still a core.
    /// Every attempt is limited by the minimisation budget.
    fn reduce_core(&mut self, mut core: Vec<Literal>) -> Result<Vec<Literal>, MaxSatError> {
        let conflict_budget = Some(self.options.minimisation_budget);

        let mut index = 0;
        while index < core.len() && core.len() > 1 {
            let candidate = core
                .iter()
                .enumerate()
                .filter(|&(position, _)| position != index)
                .map(|(_, &literal)| literal)
                .collect::<Vec<_>>();

            match self.solve_under_assumptions(&candidate, conflict_budget)? {
                OracleAnswer::Core(reduced) => {
                    // The smaller core may also drop literals which were found necessary before.
                    let num_kept_before = core[..index]
                        .iter()
                        .filter(|literal| reduced.contains(literal))
                        .count();
                    core.retain(|literal| reduced.contains(literal));
                    index = num_kept_before;
                }
                OracleAnswer::Satisfiable(model) => {
                    self.update_upper_bound(&model);
                    index += 1;
                }
                OracleAnswer::Unknown => index += 1,
            }
        }

        Ok(core)
    }
}
