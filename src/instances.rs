//! # Variable Management and Clause Collections
//!
//! The other half of a clause sink: variable managers handing out fresh
//! variables for auxiliary literals, and [`Cnf`], a plain clause collection.

use crate::{
    types::{Lit, Var},
    var,
};

mod sat;
pub use sat::Cnf;

/// Trait for variable managers keeping track of used variables
pub trait ManageVars {
    /// Uses up the next free variable
    fn new_var(&mut self) -> Var;
    /// Uses up the next free variable and returns its positive literal
    fn new_lit(&mut self) -> Lit {
        self.new_var().pos_lit()
    }
    /// Uses up `n` fresh variables and returns their positive literals
    fn new_lits(&mut self, n: usize) -> Vec<Lit> {
        (0..n).map(|_| self.new_lit()).collect()
    }
    /// Gets the used variable with the highest index
    fn max_var(&self) -> Option<Var>;
    /// Increases the next free variable index if the provided variable has a
    /// higher index than the next variable in the manager.
    /// Returns true if the next free index has been increased and false otherwise.
    fn increase_next_free(&mut self, v: Var) -> bool;
    /// Marks variables up to the given one as used. Returns true if the next
    /// free index has been increased and false otherwise.
    fn mark_used(&mut self, v: Var) -> bool {
        self.increase_next_free(v + 1)
    }
    /// Gets the number of used variables. Typically this is just the index of
    /// the next free variable.
    fn n_used(&self) -> u32;
    /// Forget variables `>= min_var`
    fn forget_from(&mut self, min_var: Var);
}

/// Simple counting variable manager
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasicVarManager {
    next_var: Var,
}

impl BasicVarManager {
    /// Creates a new variable manager from a next free variable
    pub fn from_next_free(next_var: Var) -> BasicVarManager {
        BasicVarManager { next_var }
    }

    /// Gets the next free variable without using it up
    pub fn next_free(&self) -> Var {
        self.next_var
    }
}

impl ManageVars for BasicVarManager {
    fn new_var(&mut self) -> Var {
        let v = self.next_var;
        self.next_var += 1;
        v
    }

    fn max_var(&self) -> Option<Var> {
        if self.next_var == var![0] {
            None
        } else {
            Some(self.next_var - 1)
        }
    }

    fn increase_next_free(&mut self, v: Var) -> bool {
        if v > self.next_var {
            self.next_var = v;
            return true;
        };
        false
    }

    fn n_used(&self) -> u32 {
        self.next_var.idx32()
    }

    fn forget_from(&mut self, min_var: Var) {
        self.next_var = std::cmp::min(self.next_var, min_var)
    }
}

impl Default for BasicVarManager {
    fn default() -> Self {
        Self {
            next_var: Var::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BasicVarManager, ManageVars};
    use crate::{lit, var};

    #[test]
    fn var_manager_sequence() {
        let mut vm = BasicVarManager::default();
        assert_eq!(vm.max_var(), None);
        assert_eq!(vm.new_var(), var![0]);
        assert_eq!(vm.new_lit(), lit![1]);
        assert_eq!(vm.new_lits(2), vec![lit![2], lit![3]]);
        assert_eq!(vm.max_var(), Some(var![3]));
        assert_eq!(vm.n_used(), 4);
    }

    #[test]
    fn var_manager_increase() {
        let mut vm = BasicVarManager::default();
        assert!(vm.increase_next_free(var![5]));
        assert!(!vm.increase_next_free(var![3]));
        assert!(vm.mark_used(var![5]));
        assert_eq!(vm.new_var(), var![6]);
    }

    #[test]
    fn var_manager_forget() {
        let mut vm = BasicVarManager::from_next_free(var![10]);
        vm.forget_from(var![4]);
        assert_eq!(vm.next_free(), var![4]);
        vm.forget_from(var![8]);
        assert_eq!(vm.next_free(), var![4]);
        assert_eq!(vm.new_var(), var![4]);
    }
}
