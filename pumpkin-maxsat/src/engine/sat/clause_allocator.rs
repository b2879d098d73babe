use std::ops::Index;
use std::ops::IndexMut;

use super::Clause;
use super::ClauseReference;
use crate::basic_types::Literal;
use crate::pumpkin_assert_moderate;

/// Owns every clause of the engine. Deleted slots are recycled for new clauses.
#[derive(Debug, Default)]
pub(crate) struct ClauseAllocator {
    allocated_clauses: Vec<Clause>,
    deleted_clause_references: Vec<ClauseReference>,
}

impl ClauseAllocator {
    pub(crate) fn create_clause(
        &mut self,
        literals: Vec<Literal>,
        is_learned: bool,
    ) -> ClauseReference {
        let clause = Clause::new(literals, is_learned);

        if let Some(clause_reference) = self.deleted_clause_references.pop() {
            self.allocated_clauses[clause_reference.id as usize] = clause;
            clause_reference
        } else {
            self.allocated_clauses.push(clause);
            ClauseReference {
                id: (self.allocated_clauses.len() - 1) as u32,
            }
        }
    }

    /// Marks the clause as deleted and makes its slot available; the caller is responsible for
    /// removing the clause from the watch lists first.
    pub(crate) fn delete_clause(&mut self, clause_reference: ClauseReference) {
        pumpkin_assert_moderate!(
            !self[clause_reference].is_deleted(),
            "Cannot delete an already deleted clause."
        );

        self[clause_reference].mark_deleted();
        self.deleted_clause_references.push(clause_reference);
    }

    pub(crate) fn num_clauses(&self) -> usize {
        self.allocated_clauses.len() - self.deleted_clause_references.len()
    }
}

impl Index<ClauseReference> for ClauseAllocator {
    type Output = Clause;

    fn index(&self, clause_reference: ClauseReference) -> &Clause {
        &self.allocated_clauses[clause_reference.id as usize]
    }
}

impl IndexMut<ClauseReference> for ClauseAllocator {
    fn index_mut(&mut self, clause_reference: ClauseReference) -> &mut Clause {
        &mut self.allocated_clauses[clause_reference.id as usize]
    }
}
