//! # "Atomic"/"Trivial" Encodings
//!
//! Implications from cubes to literals as single clauses. The merge
//! relations of the totalizer encodings are built from these.

use crate::types::{Clause, Lit};

/// Implication of form `(a1 & a2 & ... & an) -> b`
#[must_use]
pub fn cube_impl_lit(a: &[Lit], b: Lit) -> Clause {
    let mut cl: Clause = a.iter().map(|ai| !*ai).collect();
    cl.add(b);
    cl
}

#[cfg(test)]
mod tests {
    use crate::{clause, lit};

    #[test]
    fn cube_impl_lit() {
        assert_eq!(
            super::cube_impl_lit(&[lit![0], !lit![1]], lit![2]),
            clause![!lit![0], lit![1], lit![2]]
        );
        assert_eq!(super::cube_impl_lit(&[], lit![2]), clause![lit![2]]);
    }
}
