use rand::rngs::SmallRng;
use rand::Rng;

use super::AssignmentsPropositional;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyValueHeap;

/// VSIDS: variables involved in recent conflicts are preferred for branching.
#[derive(Debug)]
pub(crate) struct PropositionalVariableSelector {
    heap: KeyValueHeap<PropositionalVariable, f64>,
    increment: f64,
    max_threshold: f64,
    decay_factor: f64,
}

impl Default for PropositionalVariableSelector {
    fn default() -> Self {
        PropositionalVariableSelector {
            heap: KeyValueHeap::default(),
            increment: 1.0,
            max_threshold: 1e100,
            decay_factor: 0.95,
        }
    }
}

impl PropositionalVariableSelector {
    /// Registers a new variable. A tiny random initial activity breaks ties between variables
    /// which have not been part of a conflict yet.
    pub(crate) fn grow(&mut self, variable: PropositionalVariable, random: &mut SmallRng) {
        self.heap.grow(variable, random.gen_range(0.0..1e-5));
    }

    pub(crate) fn bump_activity(&mut self, variable: PropositionalVariable) {
        if self.heap.get_value(variable) + self.increment >= self.max_threshold {
            self.heap.divide_values(self.max_threshold);
            self.increment /= self.max_threshold;
        }
        self.heap.increment(variable, self.increment);
    }

    /// Decaying is implemented by making future bumps more impactful.
    pub(crate) fn decay_activities(&mut self) {
        self.increment *= 1.0 / self.decay_factor;
    }

    pub(crate) fn restore(&mut self, variable: PropositionalVariable) {
        self.heap.restore_key(variable);
    }

    pub(crate) fn remove(&mut self, variable: PropositionalVariable) {
        self.heap.delete_key(variable);
    }

    /// Returns the unassigned variable with the highest activity. Assigned variables are removed
    /// lazily from the heap.
    pub(crate) fn next_variable(
        &mut self,
        assignments: &AssignmentsPropositional,
    ) -> Option<PropositionalVariable> {
        while let Some(candidate) = self.heap.peek_max() {
            if !assignments.is_variable_assigned(candidate) {
                return Some(candidate);
            }
            let _ = self.heap.pop_max();
        }
        None
    }
}
