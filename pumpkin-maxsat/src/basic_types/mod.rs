mod constraint_operation_error;
mod hash_structures;
mod literal;
mod propositional_variable;
pub(crate) mod sequence_generators;
mod stopwatch;

pub use constraint_operation_error::ConstraintOperationError;
pub use hash_structures::HashMap;
pub use hash_structures::HashSet;
pub use literal::Literal;
pub use propositional_variable::PropositionalVariable;
pub use stopwatch::Stopwatch;
