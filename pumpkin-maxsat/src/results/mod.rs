//! The outcome of a MaxSAT solve and its textual form.
mod maxsat_solution;

pub use maxsat_solution::MaxSatSolution;
pub use maxsat_solution::SolutionLines;
