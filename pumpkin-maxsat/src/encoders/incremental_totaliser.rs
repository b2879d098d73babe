use log::debug;
use thiserror::Error;

use crate::basic_types::ConstraintOperationError;
use crate::basic_types::Literal;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::SatOracle;
use crate::engine::VariableAllocator;
use crate::pumpkin_assert_moderate;
use crate::pumpkin_assert_simple;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingError {
    #[error("adding the encoding to the oracle failed: {0}")]
    ClauseAddition(#[from] ConstraintOperationError),
}

/// The index of a node in the arena of an [`IncrementalTotaliser`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl StorageKey for NodeId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        NodeId(index as u32)
    }
}

#[derive(Clone, Copy, Debug)]
enum NodeKind {
    Leaf,
    Sum { left: NodeId, right: NodeId },
}

#[derive(Clone, Debug)]
struct TotaliserNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    num_leaves: usize,
    /// `outputs[j]` is implied by "at least `j + 1` leaves below this node are true". For a leaf
    /// the only output is the input literal itself.
    outputs: Vec<Literal>,
    /// The counts `1..=encoded_up_to` have outputs and all of their clauses.
    encoded_up_to: usize,
}

/// An incremental totaliser over a growing set of input literals.
///
/// The nodes of the summation tree are stored in an arena and refer to each other by [`NodeId`].
/// Only the upward implications are encoded: the output for count `j` is forced to true when at
/// least `j` inputs are true. "At most `b` inputs are true" therefore holds whenever the output
/// for count `b + 1` is false, which is achieved by assuming the negation of
/// [`IncrementalTotaliser::at_most_literal`].
///
/// Raising the bound adds clauses for the new counts at the existing nodes; adding inputs
/// builds a tree over the new inputs and joins it with the old tree under a new root. No clause
/// is ever retracted.
#[derive(Clone, Debug)]
pub struct IncrementalTotaliser {
    nodes: KeyedVec<NodeId, TotaliserNode>,
    root: NodeId,
    bound: usize,
    num_clauses_added: usize,
}

impl IncrementalTotaliser {
    /// Encodes "at most `bound` of `inputs` are true".
    pub fn new(
        inputs: &[Literal],
        bound: usize,
        oracle: &mut impl SatOracle,
        allocator: &mut VariableAllocator,
    ) -> Result<IncrementalTotaliser, EncodingError> {
        pumpkin_assert_simple!(!inputs.is_empty(), "A totaliser needs at least one input.");

        let mut totaliser = IncrementalTotaliser {
            nodes: KeyedVec::default(),
            root: NodeId(0),
            bound,
            num_clauses_added: 0,
        };
        totaliser.root = totaliser.build_tree(inputs);
        totaliser.encode_node(totaliser.root, bound + 1, oracle, allocator)?;

        debug!(
            "Totaliser over {} inputs with bound {bound} added {} clauses",
            inputs.len(),
            totaliser.num_clauses_added
        );
        Ok(totaliser)
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn num_inputs(&self) -> usize {
        self.nodes[self.root].num_leaves
    }

    pub fn num_clauses_added(&self) -> usize {
        self.num_clauses_added
    }

    /// The input literals, in the order of the leaves from left to right.
    #[cfg(test)]
    pub(crate) fn inputs(&self) -> Vec<Literal> {
        let mut inputs = Vec::with_capacity(self.num_inputs());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            match self.nodes[node].kind {
                NodeKind::Leaf => inputs.push(self.nodes[node].outputs[0]),
                NodeKind::Sum { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        inputs
    }

    /// The literal which is true whenever more than `bound` inputs are true; assuming its negation
    /// enforces "at most `bound`". Returns [`None`] when the bound is vacuous, i.e. when
    /// `bound >= number of inputs`.
    pub fn at_most_literal(&self, bound: usize) -> Option<Literal> {
        pumpkin_assert_moderate!(bound <= self.bound);
        self.nodes[self.root].outputs.get(bound).copied()
    }

    /// Raises the bound to `new_bound`, adding the clauses for the newly required counts.
    pub fn increase_bound(
        &mut self,
        new_bound: usize,
        oracle: &mut impl SatOracle,
        allocator: &mut VariableAllocator,
    ) -> Result<(), EncodingError> {
        pumpkin_assert_simple!(new_bound >= self.bound, "The bound can only increase.");

        let num_clauses_before = self.num_clauses_added;
        self.bound = new_bound;
        self.encode_node(self.root, new_bound + 1, oracle, allocator)?;

        debug!(
            "Raising the totaliser bound to {new_bound} added {} clauses",
            self.num_clauses_added - num_clauses_before
        );
        Ok(())
    }

    /// Adds `new_inputs` to the totaliser while keeping the current bound.
    pub fn extend(
        &mut self,
        new_inputs: &[Literal],
        oracle: &mut impl SatOracle,
        allocator: &mut VariableAllocator,
    ) -> Result<(), EncodingError> {
        if new_inputs.is_empty() {
            return Ok(());
        }

        let num_clauses_before = self.num_clauses_added;
        let old_root = self.root;
        pumpkin_assert_moderate!(self.nodes[old_root].parent.is_none());
        let subtree = self.build_tree(new_inputs);
        let new_root = self.push_sum_node(old_root, subtree);
        self.root = new_root;
        self.encode_node(new_root, self.bound + 1, oracle, allocator)?;

        debug!(
            "Extending the totaliser with {} inputs added {} clauses",
            new_inputs.len(),
            self.num_clauses_added - num_clauses_before
        );
        Ok(())
    }

    /// Builds a balanced tree over `inputs`; no clauses are added yet.
    fn build_tree(&mut self, inputs: &[Literal]) -> NodeId {
        if let [input] = inputs {
            return self.nodes.push(TotaliserNode {
                kind: NodeKind::Leaf,
                parent: None,
                num_leaves: 1,
                outputs: vec![*input],
                encoded_up_to: 1,
            });
        }

        let (left_inputs, right_inputs) = inputs.split_at(inputs.len() / 2);
        let left = self.build_tree(left_inputs);
        let right = self.build_tree(right_inputs);
        self.push_sum_node(left, right)
    }

    fn push_sum_node(&mut self, left: NodeId, right: NodeId) -> NodeId {
        let num_leaves = self.nodes[left].num_leaves + self.nodes[right].num_leaves;
        let node = self.nodes.push(TotaliserNode {
            kind: NodeKind::Sum { left, right },
            parent: None,
            num_leaves,
            outputs: vec![],
            encoded_up_to: 0,
        });
        self.nodes[left].parent = Some(node);
        self.nodes[right].parent = Some(node);
        node
    }

    /// Makes sure the counts up to `limit` (capped by the number of leaves) are encoded at `node`
    /// and all of its descendants.
    fn encode_node(
        &mut self,
        node: NodeId,
        limit: usize,
        oracle: &mut impl SatOracle,
        allocator: &mut VariableAllocator,
    ) -> Result<(), EncodingError> {
        let target = limit.min(self.nodes[node].num_leaves);
        let already_encoded = self.nodes[node].encoded_up_to;
        if target <= already_encoded {
            return Ok(());
        }

        let NodeKind::Sum { left, right } = self.nodes[node].kind else {
            unreachable!("leaves are fully encoded on creation")
        };
        self.encode_node(left, limit, oracle, allocator)?;
        self.encode_node(right, limit, oracle, allocator)?;

        for _ in already_encoded..target {
            let output = allocator.fresh_literal();
            self.nodes[node].outputs.push(output);
        }

        // For counts i (left) and j (right) with already_encoded < i + j <= target:
        //   left_i /\ right_j -> output_{i + j}, where a count of zero is trivially true.
        let left_outputs = self.nodes[left].outputs.clone();
        let right_outputs = self.nodes[right].outputs.clone();
        for i in 0..=left_outputs.len().min(target) {
            let lowest_j = (already_encoded + 1).saturating_sub(i);
            let highest_j = (target - i).min(right_outputs.len());
            for j in lowest_j..=highest_j {
                let mut clause = Vec::with_capacity(3);
                if i > 0 {
                    clause.push(!left_outputs[i - 1]);
                }
                if j > 0 {
                    clause.push(!right_outputs[j - 1]);
                }
                clause.push(self.nodes[node].outputs[i + j - 1]);

                oracle.add_clause(&clause)?;
                self.num_clauses_added += 1;
            }
        }

        self.nodes[node].encoded_up_to = target;
        Ok(())
    }
}
