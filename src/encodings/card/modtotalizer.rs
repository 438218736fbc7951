//! # Modular Totalizer Encoding
//!
//! Implementation of the modular totalizer encoding \[1\]. Every node counts
//! its inputs in two unary parts: an upper part counting multiples of a
//! modulus `p` and a lower part counting the remainder modulo `p`. The two
//! children of a node are combined with a carry-save adder over the modulus.
//! With a modulus close to `sqrt(k)` this needs considerably fewer auxiliary
//! variables than the [`super::Totalizer`] for large bounds `k`.
//!
//! Tightening an upper bound only adds clauses over the root outputs and
//! never allocates new variables.
//!
//! ## References
//!
//! - \[1\] Toru Ogawa and Yangyang Liu and Ryuzo Hasegawa and Miyuki Koshimura and Hiroshi Fujita: _Modulo Based CNF Encoding of Cardinality Constraints and Its Application to MaxSAT Solvers_, ICTAI 2013.

use std::{cmp, ops::Range};

use itertools::iproduct;

use super::{BoundUpper, Encode};
use crate::{
    clause,
    encodings::{atomics, CollectClauses, EncodeStats, Error, NodeId},
    instances::ManageVars,
    types::{Clause, Lit},
    utils::{self, unreachable_none},
    OutOfMemory,
};

/// Implementation of the modular totalizer encoding \[1\] for upper bounds.
///
/// The modulus is fixed the first time a tree is built (or set explicitly
/// with [`ModularTotalizer::with_modulus`]) and never changes afterwards,
/// since all clauses of the tree depend on it.
///
/// # References
///
/// - \[1\] Toru Ogawa and Yangyang Liu and Ryuzo Hasegawa and Miyuki Koshimura and Hiroshi Fujita: _Modulo Based CNF Encoding of Cardinality Constraints and Its Application to MaxSAT Solvers_, ICTAI 2013.
#[derive(Default, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModularTotalizer {
    /// Input literals of the encoding
    in_lits: Vec<Lit>,
    /// The modulus, once chosen
    modulus: Option<usize>,
    /// The node arena
    nodes: Vec<Node>,
    /// The root of the tree, if constructed
    root: Option<NodeId>,
    /// The maximum upper bound the tree was built for
    max_ub: Option<usize>,
    /// The number of clauses in the encoding
    n_clauses: usize,
    /// The number of variables in the encoding
    n_vars: u32,
}

impl ModularTotalizer {
    /// Fixes the modulus of the encoding before it is built
    ///
    /// # Errors
    ///
    /// If `modulus < 2`, [`Error::InvalidModulus`]
    pub fn with_modulus(mut self, modulus: usize) -> Result<Self, Error> {
        self.set_modulus(modulus)?;
        Ok(self)
    }

    /// Fixes the modulus of the encoding before it is built
    ///
    /// # Errors
    ///
    /// - If `modulus < 2`, [`Error::InvalidModulus`]
    /// - If the tree was already built, [`Error::AlreadyEncoded`]
    pub fn set_modulus(&mut self, modulus: usize) -> Result<(), Error> {
        if modulus < 2 {
            return Err(Error::InvalidModulus(modulus));
        }
        if self.root.is_some() {
            return Err(Error::AlreadyEncoded);
        }
        self.modulus = Some(modulus);
        Ok(())
    }

    /// Gets the modulus, if it was set or chosen already
    #[must_use]
    pub fn modulus(&self) -> Option<usize> {
        self.modulus
    }

    /// Checks whether the tree of the encoding has been built
    #[must_use]
    pub fn is_encoded(&self) -> bool {
        self.root.is_some()
    }

    /// Gets the maximum depth of the tree
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.map_or(0, |root| self.depth_rec(root))
    }

    fn depth_rec(&self, id: NodeId) -> usize {
        match self.nodes[id.0].children {
            None => 1,
            Some((left, right)) => cmp::max(self.depth_rec(left), self.depth_rec(right)) + 1,
        }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Creates the node for a range of the input literals. A single input is a
    /// leaf whose lower part is the input literal itself.
    fn new_child(
        &mut self,
        range: Range<usize>,
        modulus: usize,
        var_manager: &mut dyn ManageVars,
    ) -> NodeId {
        let node = if range.len() == 1 {
            Node::leaf(self.in_lits[range.start])
        } else {
            let upper = var_manager.new_lits(range.len() / modulus);
            let lower = var_manager.new_lits(cmp::min(modulus - 1, range.len()));
            Node::internal(upper, lower)
        };
        self.insert(node)
    }

    /// Splits the inputs covered by node `id` in half, links the halves to
    /// the node with an adder and recurses into non-leaf halves
    fn to_cnf<Col>(
        &mut self,
        id: NodeId,
        range: Range<usize>,
        max_ub: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), OutOfMemory>
    where
        Col: CollectClauses,
    {
        debug_assert!(range.len() > 1);
        let modulus = unreachable_none!(self.modulus);
        let split = range.start + range.len() / 2;
        let left_range = range.start..split;
        let right_range = split..range.end;
        let left = self.new_child(left_range.clone(), modulus, var_manager);
        let right = self.new_child(right_range.clone(), modulus, var_manager);
        self.nodes[id.0].children = Some((left, right));
        self.adder(id, max_ub, collector, var_manager)?;
        if left_range.len() > 1 {
            self.to_cnf(left, left_range, max_ub, collector, var_manager)?;
        }
        if right_range.len() > 1 {
            self.to_cnf(right, right_range, max_ub, collector, var_manager)?;
        }
        Ok(())
    }

    /// Encodes the carry-save adder from the children of node `id` to the
    /// node
    fn adder<Col>(
        &mut self,
        id: NodeId,
        max_ub: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), OutOfMemory>
    where
        Col: CollectClauses,
    {
        let modulus = unreachable_none!(self.modulus);
        if !self.nodes[id.0].upper.is_empty() {
            self.nodes[id.0].carry = Some(var_manager.new_lit());
        }
        let node = &self.nodes[id.0];
        let (left, right) = unreachable_none!(node.children);
        let (left, right) = (&self.nodes[left.0], &self.nodes[right.0]);
        let carry = node.carry;

        let n_before = collector.n_clauses();
        // lower parts: remainder counts, wrapping into the carry
        let low_limit = max_ub + 2;
        collector.extend_clauses(
            iproduct!(0..=left.lower.len(), 0..=right.lower.len()).filter_map(|(i, j)| {
                let sum = i + j;
                if sum == 0 || (sum > low_limit && low_limit < modulus) {
                    return None;
                }
                let lhs = cube(left.lower.as_slice(), i, right.lower.as_slice(), j);
                Some(match sum.cmp(&modulus) {
                    cmp::Ordering::Less => {
                        let mut cl = atomics::cube_impl_lit(&lhs, node.lower[sum - 1]);
                        if let Some(carry) = carry {
                            cl.add(carry);
                        }
                        cl
                    }
                    cmp::Ordering::Equal => atomics::cube_impl_lit(&lhs, unreachable_none!(carry)),
                    cmp::Ordering::Greater => {
                        atomics::cube_impl_lit(&lhs, node.lower[sum % modulus - 1])
                    }
                })
            }),
        )?;

        // upper parts: multiples of the modulus, plus one if the carry is set
        if let Some(carry) = carry {
            let close_mod = (max_ub + 1).div_ceil(modulus);
            collector.extend_clauses(
                iproduct!(0..=left.upper.len(), 0..=right.upper.len())
                    .filter(|&(i, j)| i + j <= close_mod)
                    .flat_map(|(i, j)| {
                        let lhs = cube(left.upper.as_slice(), i, right.upper.as_slice(), j);
                        let without_carry = (i + j)
                            .checked_sub(1)
                            .and_then(|k| node.upper.get(k))
                            .map(|&c| atomics::cube_impl_lit(&lhs, c));
                        let mut with_carry: Clause = lhs.iter().map(|&l| !l).collect();
                        with_carry.add(!carry);
                        if let Some(&d) = node.upper.get(i + j) {
                            with_carry.add(d);
                        }
                        [without_carry, Some(with_carry)]
                            .into_iter()
                            .flatten()
                            .filter(|cl| cl.len() > 1)
                    }),
            )?;
        }
        tracing::trace!(
            node = id.0,
            n_clauses = collector.n_clauses() - n_before,
            "encoded modular totalizer adder"
        );
        Ok(())
    }

    /// Adds the clauses over the root outputs that enforce `sum of lits <= ub`
    fn encode_output<Col>(&self, root: NodeId, ub: usize, collector: &mut Col) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        let modulus = unreachable_none!(self.modulus);
        let root = &self.nodes[root.0];
        let ulimit = (ub + 1) / modulus;
        let llimit = (ub + 1) - ulimit * modulus;
        debug_assert!(ulimit <= root.upper.len());
        debug_assert!(llimit <= root.lower.len());
        collector.extend_clauses(root.upper[ulimit..].iter().map(|&u| clause![!u]))?;
        if ulimit != 0 && llimit != 0 {
            let u = root.upper[ulimit - 1];
            collector.extend_clauses(root.lower[llimit - 1..].iter().map(|&l| clause![!u, !l]))?;
        } else if ulimit == 0 {
            collector.extend_clauses(root.lower[llimit - 1..].iter().map(|&l| clause![!l]))?;
        } else {
            collector.add_unit(!root.upper[ulimit - 1])?;
        }
        Ok(())
    }
}

/// Gets the cube `(a_i & b_j)` from two unary counters, where index zero of a
/// counter is absent from the cube
fn cube(a: &[Lit], i: usize, b: &[Lit], j: usize) -> Vec<Lit> {
    [i.checked_sub(1).map(|i| a[i]), j.checked_sub(1).map(|j| b[j])]
        .into_iter()
        .flatten()
        .collect()
}

impl Encode for ModularTotalizer {
    fn n_lits(&self) -> usize {
        self.in_lits.len()
    }
}

impl BoundUpper for ModularTotalizer {
    /// Builds the tree. Trivial maximum bounds (`0` or at least the number of
    /// inputs) build nothing, the bounds they allow are enforced without a
    /// tree.
    fn encode_ub<Col>(
        &mut self,
        max_ub: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        let n = self.in_lits.len();
        if let Some(encoded_ub) = self.max_ub {
            if encoded_ub >= max_ub || max_ub >= n {
                return Ok(());
            }
            return Err(Error::AlreadyEncoded);
        }
        if max_ub == 0 || max_ub >= n {
            return Ok(());
        }
        let modulus = *self
            .modulus
            .get_or_insert_with(|| utils::ceil_sqrt(max_ub + 1));
        let n_clauses_before = collector.n_clauses();
        let n_vars_before = var_manager.n_used();
        let upper = var_manager.new_lits(n / modulus);
        let lower = var_manager.new_lits(modulus - 1);
        let root = self.insert(Node::internal(upper, lower));
        self.root = Some(root);
        self.max_ub = Some(max_ub);
        let res = self.to_cnf(root, 0..n, max_ub, collector, var_manager);
        self.n_clauses += collector.n_clauses() - n_clauses_before;
        self.n_vars += var_manager.n_used() - n_vars_before;
        res?;
        tracing::debug!(
            n_lits = n,
            max_ub,
            modulus,
            n_clauses = self.n_clauses,
            n_vars = self.n_vars,
            "built modular totalizer"
        );
        Ok(())
    }

    fn enforce_ub<Col>(&self, ub: usize, collector: &mut Col) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        if ub >= self.in_lits.len() {
            return Ok(());
        }
        match (self.root, self.max_ub) {
            (Some(root), Some(max_ub)) if ub <= max_ub => self.encode_output(root, ub, collector),
            (None, _) if ub == 0 => {
                collector.extend_clauses(self.in_lits.iter().map(|&l| clause![!l]))?;
                Ok(())
            }
            _ => Err(Error::NotEncoded),
        }
    }
}

impl EncodeStats for ModularTotalizer {
    fn n_clauses(&self) -> usize {
        self.n_clauses
    }

    fn n_vars(&self) -> u32 {
        self.n_vars
    }
}

impl From<Vec<Lit>> for ModularTotalizer {
    fn from(lits: Vec<Lit>) -> Self {
        Self {
            in_lits: lits,
            ..Default::default()
        }
    }
}

impl FromIterator<Lit> for ModularTotalizer {
    fn from_iter<T: IntoIterator<Item = Lit>>(iter: T) -> Self {
        Self::from(Vec::from_iter(iter))
    }
}

/// A node of the modular totalizer
#[cfg_attr(feature = "internals", visibility::make(pub))]
#[cfg_attr(docsrs, doc(cfg(feature = "internals")))]
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Node {
    /// Unary count of the multiples of the modulus. Empty if the node covers
    /// fewer inputs than the modulus.
    upper: Vec<Lit>,
    /// Unary count of the remainder modulo the modulus. For leaves, this is
    /// the input literal.
    lower: Vec<Lit>,
    /// Set if the remainders of the children add up to at least the modulus
    carry: Option<Lit>,
    /// The left and right child
    children: Option<(NodeId, NodeId)>,
}

impl Node {
    fn leaf(lit: Lit) -> Self {
        Node {
            upper: vec![],
            lower: vec![lit],
            carry: None,
            children: None,
        }
    }

    fn internal(upper: Vec<Lit>, lower: Vec<Lit>) -> Self {
        Node {
            upper,
            lower,
            carry: None,
            children: None,
        }
    }
}
