use std::num::NonZeroI32;

use crate::basic_types::Literal;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::Model;
use crate::parsers::dimacs::DimacsSink;
use crate::pumpkin_assert_simple;

/// Identifies a soft clause of a [`Formula`]; identifiers stay valid when clauses are hardened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoftClauseId(u32);

impl StorageKey for SoftClauseId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        SoftClauseId(index as u32)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoftClause {
    literals: Vec<Literal>,
    weight: u64,
    is_hardened: bool,
}

impl SoftClause {
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Whether the clause has been moved into the hard clauses.
    pub fn is_hardened(&self) -> bool {
        self.is_hardened
    }

    pub fn is_satisfied_by(&self, model: &Model) -> bool {
        self.literals.iter().any(|&literal| model.is_true(literal))
    }
}

/// Hard clauses, weighted soft clauses and the number of variables they range over.
///
/// Once built, the only mutation is [`Formula::harden`], which moves a soft clause into the hard
/// clauses.
#[derive(Clone, Debug, Default)]
pub struct Formula {
    num_variables: u32,
    hard_clauses: Vec<Vec<Literal>>,
    soft_clauses: KeyedVec<SoftClauseId, SoftClause>,
}

impl Formula {
    /// Creates a formula from `(clause, weight)` pairs; a weight of zero or [`None`] denotes a
    /// hard clause. The variables are `1..=n` where `n` is the largest index used.
    pub fn new(clauses: impl IntoIterator<Item = (Vec<Literal>, Option<u64>)>) -> Formula {
        let mut formula = Formula::default();
        for (literals, weight) in clauses {
            match weight {
                None | Some(0) => formula.push_hard_clause(literals),
                Some(weight) => {
                    let _ = formula.push_soft_clause(literals, weight);
                }
            }
        }
        formula
    }

    /// An empty formula over the variables `1..=num_variables`.
    pub fn with_num_variables(num_variables: u32) -> Formula {
        Formula {
            num_variables,
            ..Formula::default()
        }
    }

    pub fn push_hard_clause(&mut self, literals: Vec<Literal>) {
        self.accommodate_literals(&literals);
        self.hard_clauses.push(literals);
    }

    pub fn push_soft_clause(&mut self, literals: Vec<Literal>, weight: u64) -> SoftClauseId {
        pumpkin_assert_simple!(weight > 0, "Soft clauses need a positive weight.");

        self.accommodate_literals(&literals);
        self.soft_clauses.push(SoftClause {
            literals,
            weight,
            is_hardened: false,
        })
    }

    fn accommodate_literals(&mut self, literals: &[Literal]) {
        let largest_index = literals
            .iter()
            .map(|literal| literal.get_propositional_variable().get_index())
            .max()
            .unwrap_or(0);
        self.num_variables = self.num_variables.max(largest_index);
    }

    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    pub fn hard_clauses(&self) -> impl Iterator<Item = &[Literal]> + '_ {
        self.hard_clauses.iter().map(Vec::as_slice)
    }

    /// The soft clauses which have not been hardened.
    pub fn soft_clauses(&self) -> impl Iterator<Item = (SoftClauseId, &SoftClause)> + '_ {
        self.soft_clauses
            .keys()
            .zip(self.soft_clauses.iter())
            .filter(|(_, soft_clause)| !soft_clause.is_hardened)
    }

    pub fn soft_clause(&self, soft_clause: SoftClauseId) -> &SoftClause {
        &self.soft_clauses[soft_clause]
    }

    pub fn num_soft_clauses(&self) -> usize {
        self.soft_clauses.len()
    }

    /// The sum of the declared weights of all soft clauses, including hardened ones; [`None`] if
    /// the sum does not fit in a `u64`.
    pub fn total_soft_weight(&self) -> Option<u64> {
        self.soft_clauses
            .iter()
            .try_fold(0_u64, |total, soft_clause| total.checked_add(soft_clause.weight))
    }

    /// Moves the soft clause into the hard clauses. Hardening is idempotent.
    pub fn harden(&mut self, soft_clause: SoftClauseId) {
        if self.soft_clauses[soft_clause].is_hardened {
            return;
        }
        self.soft_clauses[soft_clause].is_hardened = true;
        let literals = self.soft_clauses[soft_clause].literals.clone();
        self.hard_clauses.push(literals);
    }

    /// The total weight of the soft clauses violated by `model`; hardened clauses are counted with
    /// their declared weight. Saturates at `u64::MAX`.
    pub fn cost_of(&self, model: &Model) -> u64 {
        self.soft_clauses
            .iter()
            .filter(|soft_clause| !soft_clause.is_satisfied_by(model))
            .fold(0, |cost, soft_clause| cost.saturating_add(soft_clause.weight))
    }

    pub fn satisfies_hard_clauses(&self, model: &Model) -> bool {
        self.hard_clauses
            .iter()
            .all(|clause| clause.iter().any(|&literal| model.is_true(literal)))
    }
}

impl DimacsSink for Formula {
    type ConstructorArgs = ();
    type Formula = Formula;

    fn empty(_: Self::ConstructorArgs, num_variables: usize) -> Self {
        Formula::with_num_variables(num_variables as u32)
    }

    fn add_hard_clause(&mut self, clause: &[NonZeroI32]) {
        self.push_hard_clause(clause.iter().copied().map(Literal::from_dimacs).collect());
    }

    fn add_soft_clause(&mut self, clause: &[NonZeroI32], weight: u64) {
        let _ = self.push_soft_clause(
            clause.iter().copied().map(Literal::from_dimacs).collect(),
            weight,
        );
    }

    fn into_formula(self) -> Self::Formula {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroI32;

    use super::Formula;
    use crate::basic_types::Literal;
    use crate::engine::Model;

    fn clause(literals: &[i32]) -> Vec<Literal> {
        literals
            .iter()
            .map(|&dimacs| Literal::from_dimacs(NonZeroI32::new(dimacs).unwrap()))
            .collect()
    }

    fn example() -> Formula {
        Formula::new([
            (clause(&[1, 2]), None),
            (clause(&[-1]), Some(0)),
            (clause(&[1]), Some(4)),
            (clause(&[-2, 3]), Some(2)),
        ])
    }

    #[test]
    fn zero_or_absent_weights_are_hard() {
        let formula = example();

        assert_eq!(formula.hard_clauses().count(), 2);
        assert_eq!(formula.soft_clauses().count(), 2);
        assert_eq!(formula.total_soft_weight(), Some(6));
        assert_eq!(formula.num_variables(), 3);
    }

    #[test]
    fn hardening_moves_the_clause_into_the_hard_set() {
        let mut formula = example();
        let (id, _) = formula.soft_clauses().next().unwrap();

        formula.harden(id);
        formula.harden(id);

        assert_eq!(formula.hard_clauses().count(), 3);
        assert_eq!(formula.soft_clauses().count(), 1);
        assert!(formula.soft_clause(id).is_hardened());
        assert_eq!(formula.hard_clauses().last().unwrap(), clause(&[1]).as_slice());
    }

    #[test]
    fn cost_counts_the_violated_soft_clauses() {
        let formula = example();
        // Variable zero is the constant of the oracle; x1 = false, x2 = true, x3 = false.
        let model = Model::new([true, false, true, false]);

        assert!(formula.satisfies_hard_clauses(&model));
        assert_eq!(formula.cost_of(&model), 6);

        let model = Model::new([true, false, true, true]);
        assert_eq!(formula.cost_of(&model), 4);
    }

    #[test]
    fn weights_beyond_u64_have_no_total() {
        let mut formula = Formula::new([
            (clause(&[1]), Some(u64::MAX - 1)),
            (clause(&[2]), Some(1)),
        ]);
        assert_eq!(formula.total_soft_weight(), Some(u64::MAX));

        let _ = formula.push_soft_clause(clause(&[3]), 1);
        assert_eq!(formula.total_soft_weight(), None);

        let model = Model::new([true, false, false, false]);
        assert_eq!(formula.cost_of(&model), u64::MAX);
    }
}
