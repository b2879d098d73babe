use std::ops::Index;
use std::ops::IndexMut;

use crate::basic_types::Literal;
use crate::pumpkin_assert_simple;

/// A handle to a clause stored in the [`super::ClauseAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ClauseReference {
    pub(crate) id: u32,
}

/// A clause with at least two literals. Unit clauses are never stored; they are assigned at the
/// root directly.
///
/// For a clause which propagated a literal, that literal is kept at position zero; the two
/// watched literals are always at positions zero and one.
#[derive(Debug, Clone)]
pub(crate) struct Clause {
    literals: Vec<Literal>,
    is_learned: bool,
    is_deleted: bool,
    lbd: u32,
}

impl Clause {
    pub(crate) fn new(literals: Vec<Literal>, is_learned: bool) -> Clause {
        pumpkin_assert_simple!(literals.len() >= 2);

        let lbd = literals.len() as u32;
        Clause {
            literals,
            is_learned,
            is_deleted: false,
            lbd,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.literals.len()
    }

    pub(crate) fn is_learned(&self) -> bool {
        self.is_learned
    }

    pub(crate) fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }

    pub(crate) fn get_literal_slice(&self) -> &[Literal] {
        &self.literals
    }

    pub(crate) fn get_lbd(&self) -> u32 {
        self.lbd
    }

    pub(crate) fn set_lbd(&mut self, lbd: u32) {
        self.lbd = lbd;
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Literal {
        &self.literals[index]
    }
}

impl IndexMut<usize> for Clause {
    fn index_mut(&mut self, index: usize) -> &mut Literal {
        &mut self.literals[index]
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let literals = self
            .literals
            .iter()
            .map(|literal| literal.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({literals})[learned: {}]", self.is_learned)
    }
}
