//! The reformulated objective of the core-guided search: weighted relaxation literals whose
//! weights shrink as cores are found, and the sums which the cores introduce.
use crate::basic_types::HashMap;
use crate::basic_types::Literal;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::encoders::IncrementalTotaliser;
use crate::formula::SoftClauseId;
use crate::pumpkin_assert_moderate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TermId(u32);

impl StorageKey for TermId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        TermId(index as u32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SumId(u32);

impl StorageKey for SumId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        SumId(index as u32)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TermKind {
    /// The relaxation literal of soft clauses; unit soft clauses over the same literal share a
    /// term.
    SoftClauses(Vec<SoftClauseId>),
    /// The output of a sum which is true when more than `bound` of its inputs are true.
    SumOutput { sum: SumId, bound: usize },
}

#[derive(Clone, Debug)]
pub(crate) struct ObjectiveTerm {
    pub(crate) relaxation_literal: Literal,
    pub(crate) kind: TermKind,
    pub(crate) residual_weight: u64,
    pub(crate) is_hardened: bool,
}

impl ObjectiveTerm {
    /// A term takes part in the search until its weight is used up or it is hardened.
    pub(crate) fn is_live(&self) -> bool {
        self.residual_weight > 0 && !self.is_hardened
    }

    /// The literal which is assumed to keep the term from being violated.
    pub(crate) fn assumption(&self) -> Literal {
        !self.relaxation_literal
    }
}

/// A cardinality constraint created from a core, with the weight of that core.
///
/// Only one output of a sum is activated at a time: when the output for bound `b` turns up in a
/// core, the bound becomes `b + 1` and the next output enters the objective with [`Sum::weight`].
#[derive(Clone, Debug)]
pub(crate) struct Sum {
    pub(crate) totaliser: IncrementalTotaliser,
    pub(crate) weight: u64,
    /// The oracle has proven that at least this many inputs are true.
    pub(crate) entailed: usize,
    /// Whether an output of this sum is the input of another sum.
    pub(crate) is_nested: bool,
}

impl Sum {
    pub(crate) fn new(totaliser: IncrementalTotaliser, weight: u64) -> Sum {
        Sum {
            totaliser,
            weight,
            entailed: 1,
            is_nested: false,
        }
    }

    /// The bound has reached the number of inputs; none of its outputs can be violated anymore.
    pub(crate) fn is_retired(&self) -> bool {
        self.totaliser.bound() >= self.totaliser.num_inputs()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Objective {
    terms: KeyedVec<TermId, ObjectiveTerm>,
    by_assumption: HashMap<Literal, TermId>,
}

impl Objective {
    pub(crate) fn add_term(
        &mut self,
        relaxation_literal: Literal,
        kind: TermKind,
        weight: u64,
    ) -> TermId {
        pumpkin_assert_moderate!(
            !self.by_assumption.contains_key(&!relaxation_literal),
            "Relaxation literals are never shared between terms."
        );

        let term = self.terms.push(ObjectiveTerm {
            relaxation_literal,
            kind,
            residual_weight: weight,
            is_hardened: false,
        });
        let _ = self.by_assumption.insert(!relaxation_literal, term);
        term
    }

    pub(crate) fn term(&self, term: TermId) -> &ObjectiveTerm {
        &self.terms[term]
    }

    pub(crate) fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub(crate) fn term_of_assumption(&self, assumption: Literal) -> Option<TermId> {
        self.by_assumption.get(&assumption).copied()
    }

    pub(crate) fn live_terms(&self) -> impl Iterator<Item = (TermId, &ObjectiveTerm)> + '_ {
        self.terms
            .keys()
            .zip(self.terms.iter())
            .filter(|(_, term)| term.is_live())
    }

    /// The assumptions of the live terms whose residual weight is accepted by `is_active`, in
    /// the order in which the terms were created.
    pub(crate) fn assumptions(&self, is_active: impl Fn(u64) -> bool) -> Vec<Literal> {
        self.live_terms()
            .filter(|(_, term)| is_active(term.residual_weight))
            .map(|(_, term)| term.assumption())
            .collect()
    }

    /// Subtracts `weight` from the residual weight of the term; returns whether the term is used
    /// up.
    pub(crate) fn decrease_weight(&mut self, term: TermId, weight: u64) -> bool {
        let term = &mut self.terms[term];
        pumpkin_assert_moderate!(term.residual_weight >= weight);

        term.residual_weight -= weight;
        term.residual_weight == 0
    }

    /// Removes the term from the objective; its relaxation literal is returned so the caller can
    /// fix it to false.
    pub(crate) fn harden(&mut self, term: TermId) -> Literal {
        let term = &mut self.terms[term];
        term.is_hardened = true;
        term.relaxation_literal
    }

    pub(crate) fn total_live_weight(&self) -> u64 {
        self.live_terms().map(|(_, term)| term.residual_weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::Objective;
    use super::TermKind;
    use crate::basic_types::Literal;
    use crate::basic_types::PropositionalVariable;
    use crate::containers::StorageKey;
    use crate::formula::SoftClauseId;

    fn relaxation(index: u32) -> Literal {
        Literal::new(PropositionalVariable::new(index), true)
    }

    fn soft(index: usize) -> TermKind {
        TermKind::SoftClauses(vec![SoftClauseId::create_from_index(index)])
    }

    #[test]
    fn assumptions_respect_the_level() {
        let mut objective = Objective::default();
        let _ = objective.add_term(relaxation(1), soft(0), 10);
        let _ = objective.add_term(relaxation(2), soft(1), 3);

        assert_eq!(objective.assumptions(|weight| weight >= 5), vec![!relaxation(1)]);
        assert_eq!(
            objective.assumptions(|weight| weight >= 1),
            vec![!relaxation(1), !relaxation(2)]
        );
    }

    #[test]
    fn used_up_and_hardened_terms_are_not_assumed() {
        let mut objective = Objective::default();
        let first = objective.add_term(relaxation(1), soft(0), 4);
        let second = objective.add_term(relaxation(2), soft(1), 4);
        let third = objective.add_term(relaxation(3), soft(2), 6);

        assert!(objective.decrease_weight(first, 4));
        assert!(!objective.decrease_weight(third, 4));
        assert_eq!(objective.harden(second), relaxation(2));

        assert_eq!(objective.assumptions(|_| true), vec![!relaxation(3)]);
        assert_eq!(objective.total_live_weight(), 2);
        assert_eq!(objective.term_of_assumption(!relaxation(2)), Some(second));
        assert_eq!(objective.term_of_assumption(relaxation(2)), None);
    }
}
