//! # Totalizer Encoding
//!
//! Implementation of the binary adder tree totalizer encoding \[1\].
//! Tightening a bound is incremental as described in \[2\]: the outputs of the
//! tree are built once for the loosest bound and every tighter bound is
//! enforced by one additional unit clause.
//!
//! ## References
//!
//! - \[1\] Olivier Bailleux and Yacine Boufkhad: _Efficient CNF Encoding of Boolean Cardinality Constraints_, CP 2003.
//! - \[2\] Ruben Martins and Saurabh Joshi and Vasco Manquinho and Ines Lynce: _Incremental Cardinality Constraints for MaxSAT_, CP 2014.

use std::{cmp, ops::Range, slice};

use itertools::iproduct;

use super::{BoundLower, BoundType, BoundUpper, Encode};
use crate::{
    encodings::{atomics, CollectClauses, EncodeStats, Error, NodeId},
    instances::ManageVars,
    types::Lit,
    OutOfMemory,
};

/// Implementation of the binary adder tree totalizer encoding \[1\].
/// The tree is stored in a node arena and built for one bound direction.
///
/// # References
///
/// - \[1\] Olivier Bailleux and Yacine Boufkhad: _Efficient CNF Encoding of Boolean Cardinality Constraints_, CP 2003.
/// - \[2\] Ruben Martins and Saurabh Joshi and Vasco Manquinho and Ines Lynce: _Incremental Cardinality Constraints for MaxSAT_, CP 2014.
#[derive(Default, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Totalizer {
    /// Input literals of the tree
    in_lits: Vec<Lit>,
    /// The node arena
    nodes: Vec<Node>,
    /// The root of the tree, if constructed
    root: Option<NodeId>,
    /// The bound type and maximum bound the tree was built for
    encoded: Option<(BoundType, usize)>,
    /// The number of clauses in the totalizer
    n_clauses: usize,
    /// The number of variables in the totalizer
    n_vars: u32,
}

impl Totalizer {
    /// Gets the maximum depth of the tree
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.map_or(0, |root| self.nodes[root.0].depth())
    }

    /// Gets the bound type the tree was built for, if it was built
    #[must_use]
    pub fn bound_type(&self) -> Option<BoundType> {
        self.encoded.map(|(bt, _)| bt)
    }

    /// Gets the output literals of the root node. The `i`-th literal (from
    /// zero) is implied by or implies having more than `i` true inputs,
    /// depending on the bound type.
    #[must_use]
    pub fn output_lits(&self) -> &[Lit] {
        match self.root {
            Some(root) => self.nodes[root.0].lits(),
            None => &[],
        }
    }

    /// Recursively builds the tree structure over a range of the input
    /// literals and returns the id of its root
    fn build_tree(&mut self, range: Range<usize>) -> NodeId {
        debug_assert!(!range.is_empty());
        if range.len() == 1 {
            return self.insert(Node::Leaf(self.in_lits[range.start]));
        }
        let split = range.start + range.len() / 2;
        let left = self.build_tree(range.start..split);
        let right = self.build_tree(split..range.end);
        let depth = cmp::max(self.nodes[left.0].depth(), self.nodes[right.0].depth()) + 1;
        let max_val = self.nodes[left.0].max_val() + self.nodes[right.0].max_val();
        self.insert(Node::Internal {
            out_lits: vec![],
            depth,
            max_val,
            left,
            right,
        })
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Encodes the adders of the subtree rooted at `id`, depth first
    fn encode_node<Col>(
        &mut self,
        id: NodeId,
        bound_type: BoundType,
        max_rhs: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), OutOfMemory>
    where
        Col: CollectClauses,
    {
        let Node::Internal {
            left,
            right,
            max_val,
            ..
        } = self.nodes[id.0]
        else {
            return Ok(());
        };
        self.encode_node(left, bound_type, max_rhs, collector, var_manager)?;
        self.encode_node(right, bound_type, max_rhs, collector, var_manager)?;
        let n_outs = match bound_type {
            BoundType::Ub => cmp::min(max_val, max_rhs.saturating_add(1)),
            BoundType::Lb => cmp::min(max_val, max_rhs),
        };
        let outs = var_manager.new_lits(n_outs);
        let left_lits = self.nodes[left.0].lits();
        let right_lits = self.nodes[right.0].lits();
        match bound_type {
            BoundType::Ub => ub_adder(left_lits, right_lits, &outs, collector)?,
            BoundType::Lb => lb_adder(left_lits, right_lits, &outs, collector)?,
        }
        tracing::trace!(node = id.0, n_outs, "encoded totalizer adder");
        if let Node::Internal { out_lits, .. } = &mut self.nodes[id.0] {
            *out_lits = outs;
        }
        Ok(())
    }

    /// Builds the full tree for a bound type and maximum bound
    fn encode<Col>(
        &mut self,
        bound_type: BoundType,
        max_rhs: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        if let Some((bt, max)) = self.encoded {
            if bt != bound_type {
                return Err(Error::BoundTypeNotSupported);
            }
            if max >= max_rhs {
                return Ok(());
            }
            return Err(Error::AlreadyEncoded);
        }
        self.encoded = Some((bound_type, max_rhs));
        if self.in_lits.is_empty() {
            return Ok(());
        }
        let n_clauses_before = collector.n_clauses();
        let n_vars_before = var_manager.n_used();
        let root = self.build_tree(0..self.in_lits.len());
        self.root = Some(root);
        let res = self.encode_node(root, bound_type, max_rhs, collector, var_manager);
        self.n_clauses += collector.n_clauses() - n_clauses_before;
        self.n_vars += var_manager.n_used() - n_vars_before;
        res?;
        tracing::debug!(
            n_lits = self.in_lits.len(),
            %bound_type,
            max_rhs,
            n_clauses = self.n_clauses,
            n_vars = self.n_vars,
            "built totalizer"
        );
        Ok(())
    }
}

/// Upper bounding merge: `(left >= l) & (right >= r) -> (out >= l + r)`
fn ub_adder<Col>(
    left: &[Lit],
    right: &[Lit],
    outs: &[Lit],
    collector: &mut Col,
) -> Result<(), OutOfMemory>
where
    Col: CollectClauses,
{
    collector.extend_clauses(iproduct!(0..=left.len(), 0..=right.len()).filter_map(
        |(l, r)| {
            let sum = l + r;
            if sum == 0 || sum > outs.len() {
                return None;
            }
            let lhs: Vec<Lit> = [
                l.checked_sub(1).map(|l| left[l]),
                r.checked_sub(1).map(|r| right[r]),
            ]
            .into_iter()
            .flatten()
            .collect();
            Some(atomics::cube_impl_lit(&lhs, outs[sum - 1]))
        },
    ))
}

/// Lower bounding merge: `(left <= l) & (right <= r) -> (out <= l + r)`
fn lb_adder<Col>(
    left: &[Lit],
    right: &[Lit],
    outs: &[Lit],
    collector: &mut Col,
) -> Result<(), OutOfMemory>
where
    Col: CollectClauses,
{
    collector.extend_clauses(iproduct!(0..=left.len(), 0..=right.len()).filter_map(
        |(l, r)| {
            let sum = l + r;
            if sum >= outs.len() {
                return None;
            }
            let lhs: Vec<Lit> = [
                left.get(l).map(|&lit| !lit),
                right.get(r).map(|&lit| !lit),
            ]
            .into_iter()
            .flatten()
            .collect();
            debug_assert!(!lhs.is_empty());
            Some(atomics::cube_impl_lit(&lhs, !outs[sum]))
        },
    ))
}

impl Encode for Totalizer {
    fn n_lits(&self) -> usize {
        self.in_lits.len()
    }
}

impl BoundUpper for Totalizer {
    fn encode_ub<Col>(
        &mut self,
        max_ub: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        self.encode(BoundType::Ub, max_ub, collector, var_manager)
    }

    fn enforce_ub<Col>(&self, ub: usize, collector: &mut Col) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        if ub >= self.in_lits.len() {
            return Ok(());
        }
        match self.encoded {
            None => return Err(Error::NotEncoded),
            Some((BoundType::Lb, _)) => return Err(Error::BoundTypeNotSupported),
            Some((BoundType::Ub, max_ub)) if ub > max_ub => return Err(Error::NotEncoded),
            Some(_) => (),
        }
        collector.add_unit(!self.output_lits()[ub])?;
        Ok(())
    }
}

impl BoundLower for Totalizer {
    fn encode_lb<Col>(
        &mut self,
        max_lb: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        self.encode(BoundType::Lb, max_lb, collector, var_manager)
    }

    fn enforce_lb<Col>(&self, lb: usize, collector: &mut Col) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        if lb == 0 {
            return Ok(());
        }
        if lb > self.in_lits.len() {
            return Err(Error::Unsat);
        }
        match self.encoded {
            None => return Err(Error::NotEncoded),
            Some((BoundType::Ub, _)) => return Err(Error::BoundTypeNotSupported),
            Some((BoundType::Lb, max_lb)) if lb > max_lb => return Err(Error::NotEncoded),
            Some(_) => (),
        }
        collector.add_unit(self.output_lits()[lb - 1])?;
        Ok(())
    }
}

impl EncodeStats for Totalizer {
    fn n_clauses(&self) -> usize {
        self.n_clauses
    }

    fn n_vars(&self) -> u32 {
        self.n_vars
    }
}

impl From<Vec<Lit>> for Totalizer {
    fn from(lits: Vec<Lit>) -> Self {
        Self {
            in_lits: lits,
            ..Default::default()
        }
    }
}

impl FromIterator<Lit> for Totalizer {
    fn from_iter<T: IntoIterator<Item = Lit>>(iter: T) -> Self {
        Self::from(Vec::from_iter(iter))
    }
}

/// A node in the totalizer tree
#[cfg_attr(feature = "internals", visibility::make(pub))]
#[cfg_attr(docsrs, doc(cfg(feature = "internals")))]
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Node {
    /// An input literal
    Leaf(Lit),
    /// An adder over two children
    Internal {
        /// The output literals of this node
        out_lits: Vec<Lit>,
        /// The path length to the leaf furthest away in the subtree
        depth: usize,
        /// The maximum output this node can have
        max_val: usize,
        /// The left child
        left: NodeId,
        /// The right child
        right: NodeId,
    },
}

impl Node {
    /// Gets the literals counting the subtree
    fn lits(&self) -> &[Lit] {
        match self {
            Node::Leaf(lit) => slice::from_ref(lit),
            Node::Internal { out_lits, .. } => out_lits,
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal { depth, .. } => *depth,
        }
    }

    fn max_val(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal { max_val, .. } => *max_val,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{lb_adder, ub_adder, Totalizer};
    use crate::{
        encodings::{
            card::{test_utils::check_bound, BoundLower, BoundType, BoundUpper, Encode},
            CollectClauses, EncodeStats, Error,
        },
        instances::{BasicVarManager, Cnf, ManageVars},
        lit, var,
    };

    #[test]
    fn adder_leaves_ub() {
        let mut cnf = Cnf::new();
        ub_adder(&[lit![0]], &[lit![1]], &[lit![2], lit![3]], &mut cnf).unwrap();
        assert_eq!(cnf.n_clauses(), 3);
        let mut cnf = Cnf::new();
        ub_adder(&[lit![0]], &[lit![1]], &[lit![2]], &mut cnf).unwrap();
        assert_eq!(cnf.n_clauses(), 2);
    }

    #[test]
    fn adder_leaves_lb() {
        let mut cnf = Cnf::new();
        lb_adder(&[lit![0]], &[lit![1]], &[lit![2], lit![3]], &mut cnf).unwrap();
        assert_eq!(cnf.n_clauses(), 3);
        let mut cnf = Cnf::new();
        lb_adder(&[lit![0]], &[lit![1]], &[lit![2]], &mut cnf).unwrap();
        assert_eq!(cnf.n_clauses(), 1);
    }

    #[test]
    fn adder_internal_ub() {
        let mut cnf = Cnf::new();
        ub_adder(
            &[lit![0], lit![1]],
            &[lit![2], lit![3]],
            &[lit![4], lit![5], lit![6], lit![7]],
            &mut cnf,
        )
        .unwrap();
        assert_eq!(cnf.n_clauses(), 8);
    }

    #[test]
    fn tot_functions() {
        let mut tot = Totalizer::from(vec![lit![0], lit![1], lit![2], lit![3]]);
        let mut cnf = Cnf::new();
        assert_eq!(tot.enforce_ub(2, &mut cnf), Err(Error::NotEncoded));
        assert_eq!(tot.enforce_lb(2, &mut cnf), Err(Error::NotEncoded));
        let mut var_manager = BasicVarManager::from_next_free(var![4]);
        tot.encode_ub(4, &mut cnf, &mut var_manager).unwrap();
        assert_eq!(tot.depth(), 3);
        assert_eq!(tot.n_lits(), 4);
        assert_eq!(cnf.n_clauses(), 14);
        assert_eq!(tot.n_clauses(), 14);
        assert_eq!(tot.n_vars(), 8);
        assert_eq!(var_manager.n_used(), 12);
        tot.enforce_ub(2, &mut cnf).unwrap();
        assert_eq!(cnf.n_clauses(), 15);
        tot.enforce_ub(4, &mut cnf).unwrap();
        assert_eq!(cnf.n_clauses(), 15);
    }

    #[test]
    fn tot_truncated_ub() {
        let mut tot = Totalizer::from(vec![lit![0], lit![1], lit![2], lit![3]]);
        let mut cnf = Cnf::new();
        let mut var_manager = BasicVarManager::from_next_free(var![4]);
        tot.encode_ub(1, &mut cnf, &mut var_manager).unwrap();
        assert_eq!(cnf.n_clauses(), 11);
        assert_eq!(tot.n_vars(), 6);
        assert_eq!(tot.output_lits().len(), 2);
        assert_eq!(tot.enforce_ub(2, &mut cnf), Err(Error::NotEncoded));
        tot.enforce_ub(0, &mut cnf).unwrap();
    }

    #[test]
    fn tot_lb_and_ub_sizes() {
        let lits = vec![lit![0], lit![1], lit![2], lit![3]];
        let mut var_manager = BasicVarManager::from_next_free(var![4]);
        let mut cnf_ub = Cnf::new();
        Totalizer::from(lits.clone())
            .encode_ub(4, &mut cnf_ub, &mut var_manager)
            .unwrap();
        let mut cnf_lb = Cnf::new();
        Totalizer::from(lits)
            .encode_lb(4, &mut cnf_lb, &mut var_manager)
            .unwrap();
        assert_eq!(cnf_ub.n_clauses(), cnf_lb.n_clauses());
    }

    #[test]
    fn invalid_useage() {
        let mut var_manager = BasicVarManager::from_next_free(var![2]);
        let mut cnf = Cnf::new();
        let mut tot = Totalizer::from(vec![lit![0], lit![1]]);
        tot.encode_lb(2, &mut cnf, &mut var_manager).unwrap();
        assert_eq!(tot.bound_type(), Some(BoundType::Lb));
        assert_eq!(tot.enforce_ub(1, &mut cnf), Err(Error::BoundTypeNotSupported));
        assert_eq!(
            tot.encode_ub(1, &mut cnf, &mut var_manager),
            Err(Error::BoundTypeNotSupported)
        );
        assert_eq!(tot.enforce_lb(3, &mut cnf), Err(Error::Unsat));
        let mut tot = Totalizer::from(vec![lit![0], lit![1], lit![2]]);
        tot.encode_ub(1, &mut cnf, &mut var_manager).unwrap();
        tot.encode_ub(0, &mut cnf, &mut var_manager).unwrap();
        assert_eq!(
            tot.encode_ub(2, &mut cnf, &mut var_manager),
            Err(Error::AlreadyEncoded)
        );
        assert_eq!(tot.enforce_lb(1, &mut cnf), Err(Error::BoundTypeNotSupported));
    }

    #[test]
    fn single_lit() {
        let mut var_manager = BasicVarManager::from_next_free(var![1]);
        let mut cnf = Cnf::new();
        let mut tot = Totalizer::from(vec![lit![0]]);
        tot.encode_ub(0, &mut cnf, &mut var_manager).unwrap();
        assert_eq!(cnf.n_clauses(), 0);
        tot.enforce_ub(0, &mut cnf).unwrap();
        assert_eq!(cnf[0], crate::clause![!lit![0]]);
        assert_eq!(var_manager.n_used(), 1);
    }

    #[test]
    fn exhaustive_ub() {
        for n in 1..=5 {
            for ub in 0..n {
                check_bound(n, BoundType::Ub, ub, |lits, cnf, vm| {
                    let mut tot = Totalizer::from(lits);
                    tot.encode_ub(ub, cnf, vm).unwrap();
                    tot.enforce_ub(ub, cnf).unwrap();
                });
            }
        }
    }

    #[test]
    fn exhaustive_lb() {
        for n in 1..=5 {
            for lb in 1..=n {
                check_bound(n, BoundType::Lb, lb, |lits, cnf, vm| {
                    let mut tot = Totalizer::from(lits);
                    tot.encode_lb(lb, cnf, vm).unwrap();
                    tot.enforce_lb(lb, cnf).unwrap();
                });
            }
        }
    }

    #[test]
    fn exhaustive_tightened_ub() {
        // outputs built for the loosest bound must enforce every tighter one
        for n in 2..=5 {
            for ub in 0..n - 1 {
                check_bound(n, BoundType::Ub, ub, |lits, cnf, vm| {
                    let mut tot = Totalizer::from(lits);
                    tot.encode_ub(n - 1, cnf, vm).unwrap();
                    tot.enforce_ub(ub, cnf).unwrap();
                });
            }
        }
    }
}
