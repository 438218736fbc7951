//! # Constraint Types
//!
//! The [`Clause`] that encodings emit and the [`CardConstraint`] that they
//! encode.

use std::{fmt, ops};

use super::{Assignment, Lit, LitIter, TernaryVal};

/// Type representing a clause.
/// Wrapper around a std collection to allow for changing the data structure.
#[derive(Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clause {
    lits: Vec<Lit>,
}

impl Clause {
    /// Creates a new empty clause
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the clause as a slice of literals
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    /// Gets the length of the clause
    #[inline]
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    /// Checks if the clause is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    /// Checks if the clause is a unit clause
    #[inline]
    pub fn is_unit(&self) -> bool {
        self.lits.len() == 1
    }

    /// Adds a literal to the clause
    #[inline]
    pub fn add(&mut self, lit: Lit) {
        self.lits.push(lit)
    }

    /// Gets an iterator over the clause
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Lit> {
        self.lits.iter()
    }

    /// Evaluates a clause under a given assignment
    pub fn evaluate(&self, assignment: &Assignment) -> TernaryVal {
        self.iter()
            .fold(TernaryVal::False, |val, l| match assignment.lit_value(*l) {
                TernaryVal::True => TernaryVal::True,
                TernaryVal::DontCare => {
                    if val == TernaryVal::False {
                        TernaryVal::DontCare
                    } else {
                        val
                    }
                }
                TernaryVal::False => val,
            })
    }

    /// Checks whether the clause is satisfied by an assignment
    pub fn is_sat(&self, assign: &Assignment) -> bool {
        self.evaluate(assign) == TernaryVal::True
    }
}

impl<const N: usize> From<[Lit; N]> for Clause {
    fn from(value: [Lit; N]) -> Self {
        Self {
            lits: Vec::from(value),
        }
    }
}

impl From<&[Lit]> for Clause {
    fn from(value: &[Lit]) -> Self {
        Self {
            lits: Vec::from(value),
        }
    }
}

impl Extend<Lit> for Clause {
    fn extend<T: IntoIterator<Item = Lit>>(&mut self, iter: T) {
        self.lits.extend(iter)
    }
}

impl ops::Index<usize> for Clause {
    type Output = Lit;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.lits[index]
    }
}

impl<'a> IntoIterator for &'a Clause {
    type Item = &'a Lit;

    type IntoIter = std::slice::Iter<'a, Lit>;

    fn into_iter(self) -> Self::IntoIter {
        self.lits.iter()
    }
}

impl IntoIterator for Clause {
    type Item = Lit;

    type IntoIter = std::vec::IntoIter<Lit>;

    fn into_iter(self) -> Self::IntoIter {
        self.lits.into_iter()
    }
}

impl FromIterator<Lit> for Clause {
    fn from_iter<T: IntoIterator<Item = Lit>>(iter: T) -> Self {
        Self {
            lits: Vec::from_iter(iter),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        self.iter().enumerate().try_for_each(|(i, l)| {
            if i == 0 {
                write!(f, "{l}")
            } else {
                write!(f, " | {l}")
            }
        })?;
        write!(f, ")")
    }
}

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Creates a clause from a list of literals
///
/// # Examples
///
/// ```
/// use inccard::{clause, lit};
///
/// let cl = clause![lit![0], !lit![1]];
/// assert_eq!(cl.len(), 2);
/// ```
#[macro_export]
macro_rules! clause {
    ( $($l:expr),* ) => {
        {
            let mut tmp_clause = $crate::types::Clause::new();
            $(
                tmp_clause.add($l);
            )*
            tmp_clause
        }
    };
}

/// Type representing a cardinality constraint.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum CardConstraint {
    /// An upper bound cardinality constraint (`sum of lits <= b`)
    Ub {
        /// The constrained literals
        lits: Vec<Lit>,
        /// The upper bound
        b: usize,
    },
    /// A lower bound cardinality constraint (`sum of lits >= b`)
    Lb {
        /// The constrained literals
        lits: Vec<Lit>,
        /// The lower bound
        b: usize,
    },
}

impl CardConstraint {
    /// Constructs a new upper bound cardinality constraint (`sum of lits <= b`)
    pub fn new_ub<LI: LitIter>(lits: LI, b: usize) -> Self {
        CardConstraint::Ub {
            lits: lits.into_iter().collect(),
            b,
        }
    }

    /// Constructs a new lower bound cardinality constraint (`sum of lits >= b`)
    pub fn new_lb<LI: LitIter>(lits: LI, b: usize) -> Self {
        CardConstraint::Lb {
            lits: lits.into_iter().collect(),
            b,
        }
    }

    /// Gets the literals of the constraint
    pub fn lits(&self) -> &[Lit] {
        match self {
            CardConstraint::Ub { lits, .. } | CardConstraint::Lb { lits, .. } => lits,
        }
    }

    /// Gets the bound of the constraint
    pub fn bound(&self) -> usize {
        match self {
            CardConstraint::Ub { b, .. } | CardConstraint::Lb { b, .. } => *b,
        }
    }

    /// Changes the bound on the constraint
    pub fn change_bound(&mut self, new_b: usize) {
        match self {
            CardConstraint::Ub { b, .. } | CardConstraint::Lb { b, .. } => *b = new_b,
        }
    }

    /// Checks if the constraint is always satisfied
    pub fn is_tautology(&self) -> bool {
        match self {
            CardConstraint::Ub { lits, b } => *b >= lits.len(),
            CardConstraint::Lb { b, .. } => *b == 0,
        }
    }

    /// Checks if the constraint is unsatisfiable
    pub fn is_unsat(&self) -> bool {
        match self {
            CardConstraint::Ub { .. } => false,
            CardConstraint::Lb { lits, b } => *b > lits.len(),
        }
    }

    /// Checks if the constraint assigns all literals to false
    pub fn is_negative_assignment(&self) -> bool {
        matches!(self, CardConstraint::Ub { b: 0, .. })
    }

    /// Checks if the constraint assigns all literals to true
    pub fn is_positive_assignment(&self) -> bool {
        match self {
            CardConstraint::Ub { .. } => false,
            CardConstraint::Lb { lits, b } => *b == lits.len(),
        }
    }

    /// Decomposes the constraint into its literals and bound
    pub fn decompose(self) -> (Vec<Lit>, usize) {
        match self {
            CardConstraint::Ub { lits, b } | CardConstraint::Lb { lits, b } => (lits, b),
        }
    }

    /// Checks whether the constraint is satisfied by an assignment. Literals
    /// that are not assigned count as false.
    pub fn is_sat(&self, assign: &Assignment) -> bool {
        let count = assign.count_true(self.lits());
        match self {
            CardConstraint::Ub { b, .. } => count <= *b,
            CardConstraint::Lb { b, .. } => count >= *b,
        }
    }
}
