//! The SAT oracle interface used by the core-guided search, and the clausal engine which
//! implements it.
mod clausal_solver;
pub(crate) mod sat;
mod sat_oracle;
#[cfg(test)]
pub(crate) mod test_oracle;
mod variable_allocator;

pub use clausal_solver::ClausalSolver;
pub use clausal_solver::SatOptions;
pub use sat_oracle::Model;
pub use sat_oracle::OracleProtocolError;
pub use sat_oracle::OracleResult;
pub use sat_oracle::SatOracle;
pub use variable_allocator::VariableAllocator;
