use thiserror::Error;

use crate::basic_types::ConstraintOperationError;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyedVec;

/// An incremental satisfiability decision procedure which can solve under assumptions.
///
/// Clauses added through [`SatOracle::add_clause`] are retained across calls. Every
/// [`OracleResult::UnsatisfiableUnderAssumptions`] has to carry a non-empty subset of the given
/// assumptions, and every [`OracleResult::Satisfiable`] a model over all variables the oracle
/// has seen; the core-guided search checks these guarantees and reports an
/// [`OracleProtocolError`] when they are broken.
pub trait SatOracle {
    /// Makes sure that the oracle knows every variable up to and including `variable`, even if
    /// the variable does not occur in any clause.
    fn accommodate_variable(&mut self, variable: PropositionalVariable);

    /// Adds a clause which has to hold in every later call.
    fn add_clause(&mut self, literals: &[Literal]) -> Result<(), ConstraintOperationError>;

    /// Decides whether the clauses are satisfiable when every literal in `assumptions` is true.
    ///
    /// With a `conflict_budget` the oracle may give up with [`OracleResult::Unknown`].
    fn solve_under_assumptions(
        &mut self,
        assumptions: &[Literal],
        conflict_budget: Option<u64>,
    ) -> OracleResult;

    /// Logs the statistics gathered by the oracle, if it gathers any.
    fn log_statistics(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleResult {
    Satisfiable(Model),
    /// The clauses are unsatisfiable together with the returned subset of the assumptions.
    UnsatisfiableUnderAssumptions(Vec<Literal>),
    /// The clauses are unsatisfiable regardless of the assumptions.
    Unsatisfiable,
    /// The conflict budget ran out before a decision was reached.
    Unknown,
}

/// A total assignment over the variables `0..num_variables` of an oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    values: KeyedVec<PropositionalVariable, bool>,
}

impl Model {
    pub fn new(values: impl IntoIterator<Item = bool>) -> Model {
        let mut model = Model {
            values: KeyedVec::default(),
        };
        for value in values {
            let _ = model.values.push(value);
        }
        model
    }

    pub fn num_variables(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, variable: PropositionalVariable) -> bool {
        variable.get_index() < self.values.len() as u32
    }

    pub fn get_variable_value(&self, variable: PropositionalVariable) -> Option<bool> {
        self.values.get(variable).copied()
    }

    /// Whether `literal` is true; literals over variables outside of the model are false.
    pub fn is_true(&self, literal: Literal) -> bool {
        self.get_variable_value(literal.get_propositional_variable()) == Some(literal.is_positive())
    }
}

/// Violations of the [`SatOracle`] contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleProtocolError {
    #[error("the oracle reported an empty core while assumptions were given")]
    EmptyCore,
    #[error("the core literal {0} is not one of the assumptions")]
    CoreLiteralNotAssumed(Literal),
    #[error("the model covers {covered} variables, but {required} variables are in use")]
    IncompleteModel { covered: usize, required: usize },
    #[error("the oracle gave up without a conflict budget")]
    UnexpectedUnknown,
}
