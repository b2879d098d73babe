use super::AssignmentsPropositional;
use super::Clause;
use super::ClauseAllocator;
use super::ClauseReference;
use crate::basic_types::Literal;
use crate::containers::KeyedVec;
use crate::pumpkin_assert_moderate;
use crate::pumpkin_assert_simple;

#[derive(Clone, Copy, Debug)]
struct ClauseWatcher {
    /// Another literal of the clause; when it is true the clause does not need to be visited.
    cached_literal: Literal,
    clause_reference: ClauseReference,
}

/// Unit propagation over the stored clauses with two watched literals per clause.
#[derive(Debug, Default)]
pub(crate) struct ClausalPropagator {
    /// `watch_lists[l]` contains the clauses in which `l` is one of the two watched literals.
    watch_lists: KeyedVec<Literal, Vec<ClauseWatcher>>,
    next_position_on_trail_to_propagate: usize,
}

impl ClausalPropagator {
    /// Adds the watch lists for a new variable, once for each polarity.
    pub(crate) fn grow(&mut self) {
        let _ = self.watch_lists.push(vec![]);
        let _ = self.watch_lists.push(vec![]);
    }

    pub(crate) fn start_watching_clause(
        &mut self,
        clause: &Clause,
        clause_reference: ClauseReference,
    ) {
        pumpkin_assert_simple!(clause.len() >= 2);

        self.watch_lists[clause[0]].push(ClauseWatcher {
            cached_literal: clause[1],
            clause_reference,
        });
        self.watch_lists[clause[1]].push(ClauseWatcher {
            cached_literal: clause[0],
            clause_reference,
        });
    }

    pub(crate) fn remove_clause_consideration(
        &mut self,
        clause: &Clause,
        clause_reference: ClauseReference,
    ) {
        for watched_literal in [clause[0], clause[1]] {
            let watchers = &mut self.watch_lists[watched_literal];
            if let Some(index) = watchers
                .iter()
                .position(|watcher| watcher.clause_reference == clause_reference)
            {
                let _ = watchers.swap_remove(index);
            }
        }
    }

    /// Propagates every literal on the trail which has not been propagated yet.
    ///
    /// On a conflict, the falsified clause is returned; the remaining watchers of the literal
    /// being processed are kept.
    pub(crate) fn propagate(
        &mut self,
        assignments: &mut AssignmentsPropositional,
        clause_allocator: &mut ClauseAllocator,
    ) -> Result<(), ClauseReference> {
        while self.next_position_on_trail_to_propagate < assignments.trail().len() {
            let true_literal = assignments.trail()[self.next_position_on_trail_to_propagate];
            let false_literal = !true_literal;

            // The watchers are taken out of the list; the ones which should stay are written back
            // to the front of the vector, `end_index` marks the end of the kept part.
            let mut watchers = std::mem::take(&mut self.watch_lists[false_literal]);
            let mut end_index = 0;
            let mut current_index = 0;
            let mut conflict = None;

            while current_index < watchers.len() {
                let watcher = watchers[current_index];
                current_index += 1;

                if assignments.is_literal_assigned_true(watcher.cached_literal) {
                    watchers[end_index] = watcher;
                    end_index += 1;
                    continue;
                }

                let clause = &mut clause_allocator[watcher.clause_reference];
                if clause[0] == false_literal {
                    clause[0] = clause[1];
                    clause[1] = false_literal;
                }
                pumpkin_assert_moderate!(clause[1] == false_literal);

                if assignments.is_literal_assigned_true(clause[0]) {
                    watchers[end_index] = ClauseWatcher {
                        cached_literal: clause[0],
                        clause_reference: watcher.clause_reference,
                    };
                    end_index += 1;
                    continue;
                }

                let replacement = (2..clause.len())
                    .find(|&index| !assignments.is_literal_assigned_false(clause[index]));
                if let Some(index) = replacement {
                    clause[1] = clause[index];
                    clause[index] = false_literal;
                    self.watch_lists[clause[1]].push(ClauseWatcher {
                        cached_literal: clause[0],
                        clause_reference: watcher.clause_reference,
                    });
                    continue;
                }

                watchers[end_index] = watcher;
                end_index += 1;

                if assignments.is_literal_unassigned(clause[0]) {
                    assignments.enqueue_propagated_literal(clause[0], watcher.clause_reference);
                } else {
                    conflict = Some(watcher.clause_reference);
                    break;
                }
            }

            while current_index < watchers.len() {
                watchers[end_index] = watchers[current_index];
                end_index += 1;
                current_index += 1;
            }
            watchers.truncate(end_index);
            self.watch_lists[false_literal] = watchers;

            if let Some(conflicting_clause) = conflict {
                return Err(conflicting_clause);
            }
            self.next_position_on_trail_to_propagate += 1;
        }

        Ok(())
    }

    /// Rewinds the propagation pointer after backtracking.
    pub(crate) fn synchronise(&mut self, trail_size: usize) {
        self.next_position_on_trail_to_propagate =
            self.next_position_on_trail_to_propagate.min(trail_size);
    }
}

#[cfg(test)]
mod tests {
    use super::ClausalPropagator;
    use crate::basic_types::Literal;
    use crate::engine::sat::AssignmentsPropositional;
    use crate::engine::sat::ClauseAllocator;

    fn setup(num_variables: usize) -> (AssignmentsPropositional, ClausalPropagator, Vec<Literal>) {
        let mut assignments = AssignmentsPropositional::default();
        let mut propagator = ClausalPropagator::default();
        let literals = (0..num_variables)
            .map(|_| {
                propagator.grow();
                Literal::new(assignments.grow(), true)
            })
            .collect();
        (assignments, propagator, literals)
    }

    #[test]
    fn last_unassigned_literal_is_propagated() {
        let (mut assignments, mut propagator, x) = setup(3);
        let mut allocator = ClauseAllocator::default();
        let reference = allocator.create_clause(vec![x[0], x[1], x[2]], false);
        propagator.start_watching_clause(&allocator[reference], reference);

        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(!x[0]);
        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(!x[2]);

        assert!(propagator
            .propagate(&mut assignments, &mut allocator)
            .is_ok());
        assert!(assignments.is_literal_assigned_true(x[1]));
        assert_eq!(
            assignments.get_variable_reason(x[1].get_propositional_variable()),
            Some(reference)
        );
        assert_eq!(allocator[reference][0], x[1]);
    }

    #[test]
    fn falsified_clause_is_reported() {
        let (mut assignments, mut propagator, x) = setup(2);
        let mut allocator = ClauseAllocator::default();
        let first = allocator.create_clause(vec![x[0], x[1]], false);
        let second = allocator.create_clause(vec![x[0], !x[1]], false);
        propagator.start_watching_clause(&allocator[first], first);
        propagator.start_watching_clause(&allocator[second], second);

        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(!x[0]);

        assert!(propagator
            .propagate(&mut assignments, &mut allocator)
            .is_err());
    }
}
