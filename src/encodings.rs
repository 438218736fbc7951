//! # Encodings for Cardinality Constraints to CNF
//!
//! Encodings emit their clauses into a clause collector implementing
//! [`CollectClauses`] and take fresh variables from a variable manager
//! implementing [`crate::instances::ManageVars`].

use thiserror::Error;

use crate::{
    clause,
    types::{Clause, Lit},
    OutOfMemory,
};

pub mod atomics;
pub mod card;

/// Trait for collecting clauses. Mainly used when generating encodings and
/// implemented by [`crate::instances::Cnf`] and solvers.
pub trait CollectClauses {
    /// Gets the number of clauses in the collection
    fn n_clauses(&self) -> usize;

    /// Extends the clause collector with an iterator of clauses
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory, return an [`OutOfMemory`] error.
    fn extend_clauses<T>(&mut self, cl_iter: T) -> Result<(), OutOfMemory>
    where
        T: IntoIterator<Item = Clause>;

    /// Adds one clause to the collector
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory, return an [`OutOfMemory`] error.
    fn add_clause(&mut self, cl: Clause) -> Result<(), OutOfMemory> {
        self.extend_clauses([cl])
    }

    /// Adds a unit clause to the collector
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory, return an [`OutOfMemory`] error.
    fn add_unit(&mut self, a: Lit) -> Result<(), OutOfMemory> {
        self.add_clause(clause![a])
    }

    /// Adds a binary clause to the collector
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory, return an [`OutOfMemory`] error.
    fn add_binary(&mut self, a: Lit, b: Lit) -> Result<(), OutOfMemory> {
        self.add_clause(clause![a, b])
    }

    /// Adds a ternary clause to the collector
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory, return an [`OutOfMemory`] error.
    fn add_ternary(&mut self, a: Lit, b: Lit, c: Lit) -> Result<(), OutOfMemory> {
        self.add_clause(clause![a, b, c])
    }

    /// Adds a clause with four literals to the collector
    ///
    /// # Errors
    ///
    /// If the collector runs out of memory, return an [`OutOfMemory`] error.
    fn add_quaternary(&mut self, a: Lit, b: Lit, c: Lit, d: Lit) -> Result<(), OutOfMemory> {
        self.add_clause(clause![a, b, c, d])
    }
}

/// Errors from encodings
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Encode was not called before using the encoding
    #[error("not encoded to enforce bound")]
    NotEncoded,
    /// The requested encoding is unsatisfiable
    #[error("encoding is unsat")]
    Unsat,
    /// The bound lies outside of `0..=n_lits`
    #[error("bound {bound} is invalid for {n_lits} input literals")]
    InvalidBound {
        /// The requested bound
        bound: usize,
        /// The number of input literals
        n_lits: usize,
    },
    /// A tightening request that does not move the bound towards infeasibility
    #[error("bound {requested} is not tighter than the current bound {current}")]
    NotTighter {
        /// The bound that is currently enforced
        current: usize,
        /// The requested bound
        requested: usize,
    },
    /// The encoding does not support the requested bound type
    #[error("bound type not supported by this encoding")]
    BoundTypeNotSupported,
    /// The encoding was already built for a different maximum bound
    #[error("encoding was already built and cannot be extended")]
    AlreadyEncoded,
    /// The modulus of a modular encoding must be at least two
    #[error("modulus {0} is invalid, needs to be at least 2")]
    InvalidModulus(usize),
    /// The clause collector ran out of memory
    #[error("out of memory")]
    OutOfMemory(#[from] OutOfMemory),
}

/// Trait for encodings that track statistics.
pub trait EncodeStats {
    /// Gets the number of clauses in the encoding
    fn n_clauses(&self) -> usize;

    /// Gets the number of variables in the encoding
    fn n_vars(&self) -> u32;
}

/// An ID of a node in the node arena of a tree-like encoding. The usize is the
/// index in the vector of nodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct NodeId(pub usize);

#[cfg(test)]
mod tests {
    use super::{CollectClauses, Error};
    use crate::{instances::Cnf, lit, OutOfMemory};

    #[test]
    fn collect_small_arity() {
        let mut cnf = Cnf::new();
        cnf.add_unit(lit![0]).unwrap();
        cnf.add_binary(lit![0], !lit![1]).unwrap();
        cnf.add_ternary(lit![0], lit![1], lit![2]).unwrap();
        cnf.add_quaternary(lit![0], lit![1], lit![2], !lit![3])
            .unwrap();
        assert_eq!(cnf.n_clauses(), 4);
        let lens: Vec<usize> = cnf.iter().map(|cl| cl.len()).collect();
        assert_eq!(lens, vec![1, 2, 3, 4]);
    }

    #[test]
    fn error_from_oom() {
        let err: Error = OutOfMemory.into();
        assert_eq!(err, Error::OutOfMemory(OutOfMemory));
        assert_eq!(
            format!("{}", Error::InvalidBound { bound: 5, n_lits: 3 }),
            "bound 5 is invalid for 3 input literals"
        );
    }
}
