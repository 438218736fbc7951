//! # inccard - Incremental Cardinality Encodings
//!
//! `inccard` encodes cardinality constraints (`sum of lits <= k` and
//! `sum of lits >= k`) to CNF with the totalizer family of encodings, so that
//! the bound can later be tightened against an incremental SAT solver by
//! adding only a handful of clauses.
//!
//! The main entry point is [`encodings::card::IncrementalCard`]. The
//! underlying encodings, [`encodings::card::Totalizer`] and
//! [`encodings::card::ModularTotalizer`], can also be used directly through
//! the [`encodings::card::BoundUpper`] and [`encodings::card::BoundLower`]
//! traits.
//!
//! ## Features
//!
//! | Feature name | Description |
//! | --- | --- |
//! | `internals` | Make internal data structures of the encodings public. This is useful when basing a more complex encoding on one of the encodings in this crate. Note that the internal API might change between releases. |
//! | `serde` | Derive `serde` serialization for types, configurations and encodings. |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! Currently, the MSRV is 1.76.0.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

use thiserror::Error;

pub mod encodings;
pub mod instances;
pub mod solvers;
pub mod types;

mod utils;

/// Error returned when a clause collector could not reserve memory for new
/// clauses
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("clause collector ran out of memory")]
pub struct OutOfMemory;

impl From<std::collections::TryReserveError> for OutOfMemory {
    fn from(_: std::collections::TryReserveError) -> Self {
        OutOfMemory
    }
}
