//! The data structures of the clausal engine which backs [`crate::engine::ClausalSolver`].
mod assignments_propositional;
mod clausal_propagator;
mod clause;
mod clause_allocator;
mod propositional_value_selector;
mod propositional_variable_selector;

pub(crate) use assignments_propositional::AssignmentsPropositional;
pub(crate) use clausal_propagator::ClausalPropagator;
pub(crate) use clause::Clause;
pub(crate) use clause::ClauseReference;
pub(crate) use clause_allocator::ClauseAllocator;
pub(crate) use propositional_value_selector::PropositionalValueSelector;
pub(crate) use propositional_variable_selector::PropositionalVariableSelector;
