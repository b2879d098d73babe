use super::ClauseReference;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyedVec;
use crate::pumpkin_assert_moderate;
use crate::pumpkin_assert_simple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropositionalAssignmentInfo {
    Assigned {
        truth_value: bool,
        decision_level: usize,
        reason: Option<ClauseReference>,
    },
    Unassigned,
}

/// The partial assignment of the clausal engine together with its trail.
///
/// Decisions (and assumptions) have no reason; root assignments are treated as facts, their
/// reasons are never inspected during conflict analysis.
#[derive(Debug, Default)]
pub(crate) struct AssignmentsPropositional {
    assignment_info: KeyedVec<PropositionalVariable, PropositionalAssignmentInfo>,
    trail: Vec<Literal>,
    /// `trail_delimiter[i]` is the trail length at the moment decision level `i + 1` was entered.
    trail_delimiter: Vec<usize>,
}

impl AssignmentsPropositional {
    pub(crate) fn grow(&mut self) -> PropositionalVariable {
        self.assignment_info
            .push(PropositionalAssignmentInfo::Unassigned)
    }

    pub(crate) fn num_propositional_variables(&self) -> usize {
        self.assignment_info.len()
    }

    pub(crate) fn get_decision_level(&self) -> usize {
        self.trail_delimiter.len()
    }

    pub(crate) fn increase_decision_level(&mut self) {
        self.trail_delimiter.push(self.trail.len());
    }

    pub(crate) fn is_at_the_root_level(&self) -> bool {
        self.trail_delimiter.is_empty()
    }

    pub(crate) fn trail(&self) -> &[Literal] {
        &self.trail
    }

    /// The position on the trail where the first non-root assignment is (or will be) stored.
    pub(crate) fn root_trail_length(&self) -> usize {
        self.trail_delimiter.first().copied().unwrap_or(self.trail.len())
    }

    pub(crate) fn get_variable_value(&self, variable: PropositionalVariable) -> Option<bool> {
        match self.assignment_info[variable] {
            PropositionalAssignmentInfo::Assigned { truth_value, .. } => Some(truth_value),
            PropositionalAssignmentInfo::Unassigned => None,
        }
    }

    pub(crate) fn is_variable_assigned(&self, variable: PropositionalVariable) -> bool {
        self.get_variable_value(variable).is_some()
    }

    pub(crate) fn is_literal_assigned_true(&self, literal: Literal) -> bool {
        self.get_variable_value(literal.get_propositional_variable()) == Some(literal.is_positive())
    }

    pub(crate) fn is_literal_assigned_false(&self, literal: Literal) -> bool {
        self.get_variable_value(literal.get_propositional_variable())
            == Some(!literal.is_positive())
    }

    pub(crate) fn is_literal_unassigned(&self, literal: Literal) -> bool {
        !self.is_variable_assigned(literal.get_propositional_variable())
    }

    pub(crate) fn get_variable_assignment_level(&self, variable: PropositionalVariable) -> usize {
        match self.assignment_info[variable] {
            PropositionalAssignmentInfo::Assigned { decision_level, .. } => decision_level,
            PropositionalAssignmentInfo::Unassigned => {
                panic!("Unassigned variables do not have assignment levels")
            }
        }
    }

    pub(crate) fn get_literal_assignment_level(&self, literal: Literal) -> usize {
        self.get_variable_assignment_level(literal.get_propositional_variable())
    }

    pub(crate) fn get_variable_reason(
        &self,
        variable: PropositionalVariable,
    ) -> Option<ClauseReference> {
        match self.assignment_info[variable] {
            PropositionalAssignmentInfo::Assigned { reason, .. } => reason,
            PropositionalAssignmentInfo::Unassigned => None,
        }
    }

    pub(crate) fn enqueue_decision_literal(&mut self, decision_literal: Literal) {
        self.make_assignment(decision_literal, None);
    }

    pub(crate) fn enqueue_propagated_literal(
        &mut self,
        propagated_literal: Literal,
        reason: ClauseReference,
    ) {
        self.make_assignment(propagated_literal, Some(reason));
    }

    /// Assigns a literal at the root which does not need an explanation.
    pub(crate) fn enqueue_root_literal(&mut self, literal: Literal) {
        pumpkin_assert_simple!(self.is_at_the_root_level());
        self.make_assignment(literal, None);
    }

    fn make_assignment(&mut self, true_literal: Literal, reason: Option<ClauseReference>) {
        pumpkin_assert_simple!(self.is_literal_unassigned(true_literal));

        self.assignment_info[true_literal.get_propositional_variable()] =
            PropositionalAssignmentInfo::Assigned {
                truth_value: true_literal.is_positive(),
                decision_level: self.get_decision_level(),
                reason,
            };
        self.trail.push(true_literal);
    }

    /// Undoes every assignment made after `new_decision_level`, reporting each unassigned
    /// literal (in reverse trail order) to `on_unassign`.
    pub(crate) fn synchronise(
        &mut self,
        new_decision_level: usize,
        mut on_unassign: impl FnMut(Literal),
    ) {
        pumpkin_assert_moderate!(new_decision_level <= self.get_decision_level());
        if new_decision_level == self.get_decision_level() {
            return;
        }

        let new_trail_length = self.trail_delimiter[new_decision_level];
        while self.trail.len() > new_trail_length {
            if let Some(literal) = self.trail.pop() {
                self.assignment_info[literal.get_propositional_variable()] =
                    PropositionalAssignmentInfo::Unassigned;
                on_unassign(literal);
            }
        }
        self.trail_delimiter.truncate(new_decision_level);
    }
}
