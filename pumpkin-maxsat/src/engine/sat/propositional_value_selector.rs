use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyedVec;

/// Phase saving: a variable is decided on the value it had when it was last unassigned.
#[derive(Debug, Default)]
pub(crate) struct PropositionalValueSelector {
    saved_phases: KeyedVec<PropositionalVariable, bool>,
}

impl PropositionalValueSelector {
    pub(crate) fn grow(&mut self) {
        let _ = self.saved_phases.push(false);
    }

    pub(crate) fn select_literal(&self, variable: PropositionalVariable) -> Literal {
        Literal::new(variable, self.saved_phases[variable])
    }

    pub(crate) fn save_phase(&mut self, literal: Literal) {
        self.saved_phases[literal.get_propositional_variable()] = literal.is_positive();
    }
}
