//! # Incremental Cardinality Constraints
//!
//! [`IncrementalCard`] owns one cardinality constraint over a set of input
//! literals and emits the clauses for a bound that is tightened over time.
//! The underlying encoding is only built once a bound is non-trivial and is
//! reused for every tighter bound afterwards.
//!
//! Bounds can only be tightened. Retreating to a looser bound is done by
//! restoring the clause collector to an earlier state, see
//! [`crate::solvers::checkpoint::CheckpointSolver`]. The handle does not
//! observe such restores.

use super::{
    BoundLower, BoundType, BoundUpper, CardConfig, CardEncoding, ModularTotalizer, Totalizer,
};
use crate::{
    clause,
    encodings::{CollectClauses, EncodeStats, Error},
    instances::ManageVars,
    types::Lit,
};

/// A cardinality constraint `sum of lits <= k` or `sum of lits >= k` whose
/// bound can be tightened incrementally
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncrementalCard {
    /// The input literals
    lits: Vec<Lit>,
    /// Whether this is an at-most or at-least constraint
    kind: BoundType,
    /// The currently enforced bound
    bound: usize,
    /// The encoding to build once the bound is non-trivial
    encoding: CardEncoding,
    /// A fixed modulus for the modular totalizer
    modulus: Option<usize>,
    /// The materialized encoding
    enc: Option<Materialized>,
}

/// The encoding behind a handle
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Materialized {
    Tot(Totalizer),
    /// For at-least constraints this is built over the negated inputs
    Mod(ModularTotalizer),
}

impl IncrementalCard {
    /// Encodes `sum of lits <= k` and returns the handle to tighten it
    ///
    /// # Errors
    ///
    /// - If `k` is larger than the number of literals, [`Error::InvalidBound`]
    /// - If the configured modulus is below two, [`Error::InvalidModulus`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    pub fn build_at_most<Col>(
        lits: Vec<Lit>,
        k: usize,
        config: &CardConfig,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<Self, Error>
    where
        Col: CollectClauses,
    {
        let mut card = Self::new(lits, BoundType::Ub, k, config.amk, config.modulus)?;
        if k == 0 {
            collector.extend_clauses(card.lits.iter().map(|&l| clause![!l]))?;
        } else if k < card.lits.len() {
            card.materialize(collector, var_manager)?;
        }
        tracing::debug!(n_lits = card.lits.len(), k, "built at-most constraint");
        Ok(card)
    }

    /// Encodes `sum of lits >= k` and returns the handle to tighten it
    ///
    /// # Errors
    ///
    /// - If `k` is larger than the number of literals, [`Error::InvalidBound`]
    /// - If the configured modulus is below two, [`Error::InvalidModulus`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    pub fn build_at_least<Col>(
        lits: Vec<Lit>,
        k: usize,
        config: &CardConfig,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<Self, Error>
    where
        Col: CollectClauses,
    {
        let mut card = Self::new(lits, BoundType::Lb, k, config.alk, config.modulus)?;
        if k == card.lits.len() {
            collector.extend_clauses(card.lits.iter().map(|&l| clause![l]))?;
        } else if k > 0 {
            card.materialize(collector, var_manager)?;
        }
        tracing::debug!(n_lits = card.lits.len(), k, "built at-least constraint");
        Ok(card)
    }

    fn new(
        lits: Vec<Lit>,
        kind: BoundType,
        bound: usize,
        encoding: CardEncoding,
        modulus: Option<usize>,
    ) -> Result<Self, Error> {
        if bound > lits.len() {
            return Err(Error::InvalidBound {
                bound,
                n_lits: lits.len(),
            });
        }
        if encoding == CardEncoding::ModularTotalizer {
            if let Some(modulus) = modulus.filter(|&m| m < 2) {
                return Err(Error::InvalidModulus(modulus));
            }
        }
        Ok(IncrementalCard {
            lits,
            kind,
            bound,
            encoding,
            modulus,
            enc: None,
        })
    }

    /// Tightens an at-most constraint to `sum of lits <= new_k`
    ///
    /// # Errors
    ///
    /// - If this is an at-least constraint, [`Error::BoundTypeNotSupported`]
    /// - If `new_k` is not smaller than the current bound, [`Error::NotTighter`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    pub fn tighten_upper<Col>(
        &mut self,
        new_k: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        if self.kind != BoundType::Ub {
            return Err(Error::BoundTypeNotSupported);
        }
        if new_k >= self.bound {
            return Err(Error::NotTighter {
                current: self.bound,
                requested: new_k,
            });
        }
        let previous = self.bound;
        self.bound = new_k;
        let res = if self.enc.is_some() {
            self.enforce(collector)
        } else if new_k == 0 {
            collector
                .extend_clauses(self.lits.iter().map(|&l| clause![!l]))
                .map_err(Error::from)
        } else {
            self.materialize(collector, var_manager)
        };
        if let Err(err) = res {
            self.bound = previous;
            return Err(err);
        }
        tracing::debug!(previous, k = new_k, "tightened at-most constraint");
        Ok(())
    }

    /// Tightens an at-least constraint to `sum of lits >= new_k`
    ///
    /// # Errors
    ///
    /// - If this is an at-most constraint, [`Error::BoundTypeNotSupported`]
    /// - If `new_k` is larger than the number of literals,
    ///   [`Error::InvalidBound`]
    /// - If `new_k` is not larger than the current bound, [`Error::NotTighter`]
    /// - If the collector runs out of memory, [`Error::OutOfMemory`]
    pub fn tighten_lower<Col>(
        &mut self,
        new_k: usize,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        if self.kind != BoundType::Lb {
            return Err(Error::BoundTypeNotSupported);
        }
        if new_k > self.lits.len() {
            return Err(Error::InvalidBound {
                bound: new_k,
                n_lits: self.lits.len(),
            });
        }
        if new_k <= self.bound {
            return Err(Error::NotTighter {
                current: self.bound,
                requested: new_k,
            });
        }
        let previous = self.bound;
        self.bound = new_k;
        let res = if self.enc.is_some() {
            self.enforce(collector)
        } else if new_k == self.lits.len() {
            collector
                .extend_clauses(self.lits.iter().map(|&l| clause![l]))
                .map_err(Error::from)
        } else {
            self.materialize(collector, var_manager)
        };
        if let Err(err) = res {
            self.bound = previous;
            return Err(err);
        }
        tracing::debug!(previous, k = new_k, "tightened at-least constraint");
        Ok(())
    }

    /// Builds the encoding for the current bound and enforces it. At-most
    /// encodings are built for the current bound since the bound can only
    /// decrease, at-least encodings are built to support every bound up to
    /// the number of inputs.
    fn materialize<Col>(
        &mut self,
        collector: &mut Col,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        debug_assert!(self.enc.is_none());
        let n = self.lits.len();
        let enc = match (self.encoding, self.kind) {
            (CardEncoding::Totalizer, BoundType::Ub) => {
                let mut tot = Totalizer::from(self.lits.clone());
                tot.encode_ub(self.bound, collector, var_manager)?;
                Materialized::Tot(tot)
            }
            (CardEncoding::Totalizer, BoundType::Lb) => {
                let mut tot = Totalizer::from(self.lits.clone());
                tot.encode_lb(n, collector, var_manager)?;
                Materialized::Tot(tot)
            }
            (CardEncoding::ModularTotalizer, kind) => {
                let inputs = match kind {
                    BoundType::Ub => self.lits.clone(),
                    BoundType::Lb => self.lits.iter().map(|&l| !l).collect(),
                };
                let mut mtot = ModularTotalizer::from(inputs);
                if let Some(modulus) = self.modulus {
                    mtot.set_modulus(modulus)?;
                }
                mtot.encode_ub(self.ub_on_inputs(), collector, var_manager)?;
                Materialized::Mod(mtot)
            }
        };
        self.enc = Some(enc);
        self.enforce(collector)
    }

    /// The current bound as an upper bound on the inputs of the modular
    /// totalizer
    fn ub_on_inputs(&self) -> usize {
        match self.kind {
            BoundType::Ub => self.bound,
            BoundType::Lb => self.lits.len() - self.bound,
        }
    }

    /// Enforces the current bound on the materialized encoding
    fn enforce<Col>(&self, collector: &mut Col) -> Result<(), Error>
    where
        Col: CollectClauses,
    {
        match (&self.enc, self.kind) {
            (Some(Materialized::Tot(tot)), BoundType::Ub) => tot.enforce_ub(self.bound, collector),
            (Some(Materialized::Tot(tot)), BoundType::Lb) => tot.enforce_lb(self.bound, collector),
            (Some(Materialized::Mod(mtot)), _) => mtot.enforce_ub(self.ub_on_inputs(), collector),
            (None, _) => Err(Error::NotEncoded),
        }
    }

    /// Gets the currently enforced bound
    #[must_use]
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Gets whether this is an at-most ([`BoundType::Ub`]) or at-least
    /// ([`BoundType::Lb`]) constraint
    #[must_use]
    pub fn kind(&self) -> BoundType {
        self.kind
    }

    /// Gets the number of input literals
    #[must_use]
    pub fn n_lits(&self) -> usize {
        self.lits.len()
    }

    /// Gets the encoding family of this constraint
    #[must_use]
    pub fn encoding(&self) -> CardEncoding {
        self.encoding
    }

    /// Checks whether the underlying encoding has been built
    #[must_use]
    pub fn is_encoded(&self) -> bool {
        self.enc.is_some()
    }

    /// Gets the modulus of the modular totalizer, once it is fixed
    #[must_use]
    pub fn modulus(&self) -> Option<usize> {
        match &self.enc {
            Some(Materialized::Mod(mtot)) => mtot.modulus(),
            _ => None,
        }
    }
}

impl EncodeStats for IncrementalCard {
    fn n_clauses(&self) -> usize {
        match &self.enc {
            Some(Materialized::Tot(tot)) => tot.n_clauses(),
            Some(Materialized::Mod(mtot)) => mtot.n_clauses(),
            None => 0,
        }
    }

    fn n_vars(&self) -> u32 {
        match &self.enc {
            Some(Materialized::Tot(tot)) => tot.n_vars(),
            Some(Materialized::Mod(mtot)) => mtot.n_vars(),
            None => 0,
        }
    }
}
