use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;

/// Hands out the indices of auxiliary variables (relaxation literals and totaliser outputs).
///
/// The indices continue after the variables of the input formula, so the original variables can
/// be told apart from auxiliary ones by their index alone. Each solve owns its allocator.
#[derive(Debug, Clone)]
pub struct VariableAllocator {
    num_original_variables: u32,
    next_index: u32,
}

impl VariableAllocator {
    pub fn new(num_original_variables: u32) -> VariableAllocator {
        VariableAllocator {
            num_original_variables,
            next_index: num_original_variables + 1,
        }
    }

    pub fn fresh_variable(&mut self) -> PropositionalVariable {
        let variable = PropositionalVariable::new(self.next_index);
        self.next_index += 1;
        variable
    }

    /// A positive literal over a fresh variable.
    pub fn fresh_literal(&mut self) -> Literal {
        Literal::new(self.fresh_variable(), true)
    }

    /// The variable with the highest index handed out so far (or the last original variable).
    pub fn last_variable(&self) -> PropositionalVariable {
        PropositionalVariable::new(self.next_index - 1)
    }

    pub fn num_original_variables(&self) -> u32 {
        self.num_original_variables
    }

    pub fn num_auxiliary_variables(&self) -> u32 {
        self.next_index - 1 - self.num_original_variables
    }
}
