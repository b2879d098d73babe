//! A scripted [`SatOracle`] which replays a fixed sequence of answers; used to test how the search
//! reacts to the answers of an oracle independently of a real decision procedure.
use std::collections::VecDeque;

use super::OracleResult;
use super::SatOracle;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;

#[derive(Debug, Default)]
pub(crate) struct ScriptedOracle {
    responses: VecDeque<OracleResult>,
    /// Every clause which was added, in order.
    pub(crate) clauses: Vec<Vec<Literal>>,
    /// The assumptions of every call, in order.
    pub(crate) calls: Vec<Vec<Literal>>,
}

impl ScriptedOracle {
    pub(crate) fn new(responses: impl IntoIterator<Item = OracleResult>) -> ScriptedOracle {
        ScriptedOracle {
            responses: responses.into_iter().collect(),
            clauses: vec![],
            calls: vec![],
        }
    }
}

impl SatOracle for ScriptedOracle {
    fn accommodate_variable(&mut self, _variable: PropositionalVariable) {}

    fn add_clause(&mut self, literals: &[Literal]) -> Result<(), ConstraintOperationError> {
        self.clauses.push(literals.to_vec());
        Ok(())
    }

    fn solve_under_assumptions(
        &mut self,
        assumptions: &[Literal],
        _conflict_budget: Option<u64>,
    ) -> OracleResult {
        self.calls.push(assumptions.to_vec());
        self.responses
            .pop_front()
            .expect("the oracle script ran out of responses")
    }
}
