//! # CNF Encodings for Cardinality Constraints
//!
//! The module contains the totalizer family of cardinality encodings and the
//! [`IncrementalCard`] handle that tightens an encoded bound over time. It
//! defines traits for upper and lower bounding encodings.
//!
//! ## Example Useage
//!
//! ```
//! use inccard::{
//!     encodings::card::{CardConfig, IncrementalCard},
//!     instances::{BasicVarManager, Cnf, ManageVars},
//!     lit, var,
//! };
//!
//! let mut var_manager = BasicVarManager::default();
//! var_manager.increase_next_free(var![4]);
//! let mut cnf = Cnf::new();
//!
//! let mut card = IncrementalCard::build_at_most(
//!     vec![lit![0], lit![1], lit![2], lit![3]],
//!     3,
//!     &CardConfig::default(),
//!     &mut cnf,
//!     &mut var_manager,
//! )
//! .unwrap();
//! card.tighten_upper(2, &mut cnf, &mut var_manager).unwrap();
//! ```

use super::{CollectClauses, Error};
use crate::{
    instances::ManageVars,
    types::{constraints::CardConstraint, Lit},
};

pub mod totalizer;
pub use totalizer::Totalizer;

pub mod modtotalizer;
pub use modtotalizer::ModularTotalizer;

pub mod incremental;
pub use incremental::IncrementalCard;

/// Trait for all cardinality encodings of form `sum of lits <> rhs`
pub trait Encode {
    /// Gets the number of input literals in the encoding
    fn n_lits(&self) -> usize;
}

/// Trait for cardinality encodings that allow upper bounding of the form `sum
/// of lits <= ub`
pub trait BoundUpper: Encode {
    /// Builds the cardinality encoding such that every upper bound up to
    /// `max_ub` can later be enforced. `var_manager` is the variable manager to
    /// use for tracking new variables.
    ///
    /// # Errors
    ///
    /// - If the encoding was already built with a lower maximum bound,
    ///   [`Error::AlreadyEncoded`]
    /// - If the encoding was built for lower bounding,
    ///   [`Error::BoundTypeNotSupported`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    fn encode_ub<Col>(
        &mut self,
        max_ub: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses;

    /// Adds clauses enforcing an upper bound (`sum of lits <= ub`). Make sure
    /// that [`BoundUpper::encode_ub`] has been called adequately, otherwise
    /// [`Error::NotEncoded`] will be returned.
    ///
    /// # Errors
    ///
    /// - If the bound was not encoded, [`Error::NotEncoded`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    fn enforce_ub<Col>(&self, ub: usize, collector: &mut Col) -> Result<(), Error>
    where
        Col: CollectClauses;

    /// Encodes an upper bound cardinality constraint to CNF
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory, [`Error::OutOfMemory`]
    fn encode_ub_constr<Col>(
        lits: Vec<Lit>,
        ub: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
        Self: FromIterator<Lit> + Sized,
    {
        let mut enc = Self::from_iter(lits);
        enc.encode_ub(ub, collector, var_manager)?;
        enc.enforce_ub(ub, collector)
    }
}

/// Trait for cardinality encodings that allow lower bounding of the form `sum
/// of lits >= lb`
pub trait BoundLower: Encode {
    /// Builds the cardinality encoding such that every lower bound up to
    /// `max_lb` can later be enforced. `var_manager` is the variable manager to
    /// use for tracking new variables.
    ///
    /// # Errors
    ///
    /// - If the encoding was already built with a lower maximum bound,
    ///   [`Error::AlreadyEncoded`]
    /// - If the encoding was built for upper bounding,
    ///   [`Error::BoundTypeNotSupported`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    fn encode_lb<Col>(
        &mut self,
        max_lb: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses;

    /// Adds clauses enforcing a lower bound (`sum of lits >= lb`). Make sure
    /// that [`BoundLower::encode_lb`] has been called adequately, otherwise
    /// [`Error::NotEncoded`] will be returned. If `lb` is higher than the
    /// number of literals in the encoding, [`Error::Unsat`] is returned.
    ///
    /// # Errors
    ///
    /// - If the bound was not encoded, [`Error::NotEncoded`]
    /// - If the bound can never be satisfied, [`Error::Unsat`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    fn enforce_lb<Col>(&self, lb: usize, collector: &mut Col) -> Result<(), Error>
    where
        Col: CollectClauses;

    /// Encodes a lower bound cardinality constraint to CNF
    ///
    /// # Errors
    ///
    /// - If the bound can never be satisfied, [`Error::Unsat`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    fn encode_lb_constr<Col>(
        lits: Vec<Lit>,
        lb: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
        Self: FromIterator<Lit> + Sized,
    {
        let mut enc = Self::from_iter(lits);
        enc.encode_lb(lb, collector, var_manager)?;
        enc.enforce_lb(lb, collector)
    }
}

/// The direction a cardinality encoding was built for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundType {
    /// Upper bounding, `sum of lits <= b`
    Ub,
    /// Lower bounding, `sum of lits >= b`
    Lb,
}

impl std::fmt::Display for BoundType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundType::Ub => write!(f, "<="),
            BoundType::Lb => write!(f, ">="),
        }
    }
}

/// The encoding family used for one bound direction of an [`IncrementalCard`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CardEncoding {
    /// The binary adder tree [`Totalizer`]
    #[default]
    Totalizer,
    /// The square root decomposition [`ModularTotalizer`]
    ModularTotalizer,
}

/// Configuration of the encodings an [`IncrementalCard`] builds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardConfig {
    /// The encoding for at-most-k constraints
    pub amk: CardEncoding,
    /// The encoding for at-least-k constraints
    pub alk: CardEncoding,
    /// A fixed modulus for the [`ModularTotalizer`]. If `None`, the modulus is
    /// chosen from the first bound that is encoded.
    pub modulus: Option<usize>,
}

impl CardConfig {
    /// Uses the same encoding for both bound directions
    #[must_use]
    pub fn with_encoding(enc: CardEncoding) -> Self {
        CardConfig {
            amk: enc,
            alk: enc,
            modulus: None,
        }
    }

    /// Sets the encoding for at-most-k constraints
    #[must_use]
    pub fn amk(mut self, enc: CardEncoding) -> Self {
        self.amk = enc;
        self
    }

    /// Sets the encoding for at-least-k constraints
    #[must_use]
    pub fn alk(mut self, enc: CardEncoding) -> Self {
        self.alk = enc;
        self
    }

    /// Fixes the modulus of modular totalizers
    #[must_use]
    pub fn modulus(mut self, modulus: usize) -> Self {
        self.modulus = Some(modulus);
        self
    }
}

/// Encodes any cardinality constraint to CNF with the default [`Totalizer`].
/// Trivial constraints are encoded with unit clauses or not at all, an
/// unsatisfiable constraint adds the empty clause.
///
/// # Errors
///
/// If the collector runs out of memory, [`Error::OutOfMemory`]
pub fn encode_cardinality_constraint<Col: CollectClauses>(
    constr: CardConstraint,
    collector: &mut Col,
    var_manager: &mut dyn ManageVars,
) -> Result<(), Error> {
    if constr.is_tautology() {
        return Ok(());
    }
    if constr.is_unsat() {
        collector.add_clause(crate::types::Clause::new())?;
        return Ok(());
    }
    if constr.is_positive_assignment() {
        collector.extend_clauses(
            constr
                .decompose()
                .0
                .into_iter()
                .map(|lit| crate::clause![lit]),
        )?;
        return Ok(());
    }
    if constr.is_negative_assignment() {
        collector.extend_clauses(
            constr
                .decompose()
                .0
                .into_iter()
                .map(|lit| crate::clause![!lit]),
        )?;
        return Ok(());
    }
    match constr {
        CardConstraint::Ub { lits, b } => {
            Totalizer::encode_ub_constr(lits, b, collector, var_manager)
        }
        CardConstraint::Lb { lits, b } => {
            Totalizer::encode_lb_constr(lits, b, collector, var_manager)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::BoundType;
    use crate::{
        instances::{BasicVarManager, Cnf, ManageVars},
        types::{Assignment, Lit, Var},
    };

    /// Builds an encoding over `n` fresh input literals with `build` and
    /// checks for every input assignment that the encoding is satisfiable
    /// exactly if the assignment satisfies the bound. Auxiliary variables are
    /// enumerated exhaustively, so this is only feasible for small encodings.
    pub(crate) fn check_bound<F>(n: usize, bound_type: BoundType, b: usize, build: F)
    where
        F: FnOnce(Vec<Lit>, &mut Cnf, &mut BasicVarManager),
    {
        let lits: Vec<Lit> = (0..n as u32).map(Lit::positive).collect();
        let mut cnf = Cnf::new();
        let mut vm = BasicVarManager::from_next_free(Var::new(n as u32));
        build(lits, &mut cnf, &mut vm);
        let n_aux = vm.n_used() as usize - n;
        assert!(n_aux <= 20, "too many auxiliary variables to enumerate");
        for inputs in 0..1u32 << n {
            let count = inputs.count_ones() as usize;
            let expected = match bound_type {
                BoundType::Ub => count <= b,
                BoundType::Lb => count >= b,
            };
            let sat = (0..1u32 << n_aux).any(|aux| {
                let assign: Assignment = (0..n)
                    .map(|i| Lit::new(i as u32, inputs & (1 << i) == 0))
                    .chain((0..n_aux).map(|j| Lit::new((n + j) as u32, aux & (1 << j) == 0)))
                    .collect();
                cnf.is_sat(&assign)
            });
            assert_eq!(
                sat, expected,
                "n = {n}, sum {bound_type} {b}, inputs = {inputs:#b}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_cardinality_constraint, CardConfig, CardEncoding};
    use crate::{
        encodings::CollectClauses,
        instances::{BasicVarManager, Cnf},
        lit,
        types::constraints::CardConstraint,
        var,
    };

    #[test]
    fn config_builders() {
        let conf = CardConfig::default();
        assert_eq!(conf.amk, CardEncoding::Totalizer);
        assert_eq!(conf.alk, CardEncoding::Totalizer);
        let conf = CardConfig::default()
            .alk(CardEncoding::ModularTotalizer)
            .modulus(4);
        assert_eq!(conf.amk, CardEncoding::Totalizer);
        assert_eq!(conf.alk, CardEncoding::ModularTotalizer);
        assert_eq!(conf.modulus, Some(4));
        assert_eq!(
            CardConfig::with_encoding(CardEncoding::ModularTotalizer).amk,
            CardEncoding::ModularTotalizer
        );
    }

    #[test]
    fn trivial_constraints() {
        let lits = vec![lit![0], lit![1], lit![2]];
        let mut vm = BasicVarManager::from_next_free(var![3]);
        let mut cnf = Cnf::new();
        encode_cardinality_constraint(CardConstraint::new_ub(lits.clone(), 3), &mut cnf, &mut vm)
            .unwrap();
        assert_eq!(cnf.n_clauses(), 0);
        encode_cardinality_constraint(CardConstraint::new_ub(lits.clone(), 0), &mut cnf, &mut vm)
            .unwrap();
        assert_eq!(cnf.n_clauses(), 3);
        encode_cardinality_constraint(CardConstraint::new_lb(lits.clone(), 3), &mut cnf, &mut vm)
            .unwrap();
        assert_eq!(cnf.n_clauses(), 6);
        encode_cardinality_constraint(CardConstraint::new_lb(lits, 4), &mut cnf, &mut vm).unwrap();
        assert!(cnf[6].is_empty());
        assert_eq!(vm.next_free(), var![3]);
    }

    #[test]
    fn non_trivial_constraint() {
        let lits = vec![lit![0], lit![1], lit![2], lit![3]];
        let mut vm = BasicVarManager::from_next_free(var![4]);
        let mut cnf = Cnf::new();
        encode_cardinality_constraint(CardConstraint::new_ub(lits, 2), &mut cnf, &mut vm).unwrap();
        assert!(cnf.n_clauses() > 0);
        assert!(vm.next_free() > var![4]);
    }
}
