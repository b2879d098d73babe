use thiserror::Error;

/// Errors related to adding clauses to a SAT oracle.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConstraintOperationError {
    /// Adding the clause led to infeasibility at the root.
    #[error("Adding the clause failed because it is infeasible at the root")]
    InfeasibleClause,
    /// A clause was added while the oracle was already in an infeasible state.
    #[error("Adding the clause failed because the oracle is in an infeasible state")]
    InfeasibleState,
}
