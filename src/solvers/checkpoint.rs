//! # Checkpointing Solver
//!
//! [`CheckpointSolver`] wraps an incremental solver and adds snapshots of the
//! clause database and the variable counter. Restoring a snapshot removes
//! every clause added after it and hands the variables allocated after it
//! back to the variable manager.
//!
//! All clauses are logged. Clauses are passed to the backend lazily when
//! solving, and after a restore that removed clauses the backend already saw,
//! a fresh backend is created and the remaining log is replayed. Query
//! statistics of replaced backends are kept. Values can only be read while
//! the last solve was satisfiable and no clauses were added or removed since.
//!
//! ```
//! use inccard::{
//!     encodings::CollectClauses,
//!     instances::{BasicVarManager, ManageVars},
//!     lit,
//!     solvers::checkpoint::CheckpointSolver,
//! };
//! # use inccard::{solvers::{Solve, SolveStats, SolverError, SolverResult, SolverStats}, types::{Lit, TernaryVal}, instances::Cnf, OutOfMemory, types::Clause};
//! # #[derive(Default)]
//! # struct Backend(Cnf);
//! # impl CollectClauses for Backend {
//! #     fn n_clauses(&self) -> usize { self.0.n_clauses() }
//! #     fn extend_clauses<T: IntoIterator<Item = Clause>>(&mut self, cls: T) -> Result<(), OutOfMemory> { self.0.extend_clauses(cls) }
//! # }
//! # impl Solve for Backend {
//! #     fn signature(&self) -> &'static str { "" }
//! #     fn solve(&mut self) -> Result<SolverResult, SolverError> { Ok(SolverResult::Sat) }
//! #     fn lit_val(&self, _: Lit) -> Result<TernaryVal, SolverError> { Ok(TernaryVal::DontCare) }
//! # }
//! # impl SolveStats for Backend {
//! #     fn stats(&self) -> SolverStats { SolverStats::default() }
//! # }
//!
//! let mut var_manager = BasicVarManager::default();
//! let mut solver = CheckpointSolver::<Backend>::default();
//! let a = var_manager.new_lit();
//! solver.add_unit(a).unwrap();
//! let token = solver.save_state(&var_manager);
//! let b = var_manager.new_lit();
//! solver.add_binary(!a, b).unwrap();
//! assert_eq!(solver.n_clauses(), 2);
//! solver.restore_state(token, &mut var_manager).unwrap();
//! assert_eq!(solver.n_clauses(), 1);
//! assert_eq!(var_manager.n_used(), 1);
//! ```

use super::{Solve, SolveStats, SolverError, SolverResult, SolverState, SolverStats};
use crate::{
    encodings::CollectClauses,
    instances::{Cnf, ManageVars},
    types::{Clause, Lit, TernaryVal, Var},
    OutOfMemory,
};

/// A snapshot of a [`CheckpointSolver`], returned by
/// [`CheckpointSolver::save_state`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateToken {
    /// Index of the snapshot on the state stack
    depth: usize,
    /// Number of clauses at the snapshot
    n_clauses: usize,
    /// Number of used variables at the snapshot
    n_vars: u32,
}

/// Solver wrapper with a stack of restorable snapshots
#[derive(Debug)]
pub struct CheckpointSolver<S> {
    backend: S,
    /// Every clause added since creation or the last restore
    log: Cnf,
    /// Number of clauses of the log already added to the backend
    synced: usize,
    /// Whether the backend contains clauses no longer in the log
    stale: bool,
    /// Whether the last solve was satisfiable and the log is unchanged since
    solved: bool,
    /// Query statistics of backends replaced by a rebuild
    retired: SolverStats,
    states: Vec<StateToken>,
}

impl<S: Solve + SolveStats + Default> Default for CheckpointSolver<S> {
    fn default() -> Self {
        CheckpointSolver {
            backend: S::default(),
            log: Cnf::new(),
            synced: 0,
            stale: false,
            solved: false,
            retired: SolverStats::default(),
            states: vec![],
        }
    }
}

impl<S: Solve + SolveStats + Default> CheckpointSolver<S> {
    /// Takes a snapshot of the clause database and the next free variable of
    /// `var_manager`
    pub fn save_state(&mut self, var_manager: &dyn ManageVars) -> StateToken {
        let token = StateToken {
            depth: self.states.len(),
            n_clauses: self.log.len(),
            n_vars: var_manager.n_used(),
        };
        self.states.push(token);
        tracing::debug!(
            depth = token.depth,
            n_clauses = token.n_clauses,
            n_vars = token.n_vars,
            "saved solver state"
        );
        token
    }

    /// Restores a snapshot. Removes all clauses added after the snapshot, resets
    /// `var_manager` to the variables used at the snapshot and drops the
    /// snapshot together with all snapshots taken after it.
    ///
    /// # Errors
    ///
    /// If the token was already restored or a snapshot taken before it was
    /// restored, [`SolverError::Api`]
    pub fn restore_state(
        &mut self,
        token: StateToken,
        var_manager: &mut dyn ManageVars,
    ) -> Result<(), SolverError> {
        if self.states.get(token.depth) != Some(&token) {
            return Err(SolverError::Api(format!(
                "state token {} is not on the state stack",
                token.depth
            )));
        }
        self.states.truncate(token.depth);
        if self.synced > token.n_clauses {
            self.stale = true;
        }
        self.log.truncate(token.n_clauses);
        self.solved = false;
        var_manager.forget_from(Var::new(token.n_vars));
        tracing::debug!(
            depth = token.depth,
            n_clauses = token.n_clauses,
            n_vars = token.n_vars,
            "restored solver state"
        );
        Ok(())
    }

    /// Gets the number of snapshots on the state stack
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Gets a reference to the backend solver
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Brings the backend up to date with the log
    fn sync(&mut self) -> Result<(), OutOfMemory> {
        if self.stale {
            tracing::debug!(n_clauses = self.log.len(), "rebuilding backend solver");
            let old = core::mem::take(&mut self.backend).stats();
            self.retired.n_sat += old.n_sat;
            self.retired.n_unsat += old.n_unsat;
            self.retired.n_terminated += old.n_terminated;
            self.retired.cpu_solve_time += old.cpu_solve_time;
            self.synced = 0;
            self.stale = false;
        }
        self.backend
            .extend_clauses(self.log.clauses()[self.synced..].iter().cloned())?;
        self.synced = self.log.len();
        Ok(())
    }
}

impl<S: Solve + SolveStats + Default> CollectClauses for CheckpointSolver<S> {
    fn n_clauses(&self) -> usize {
        self.log.len()
    }

    fn extend_clauses<T>(&mut self, cl_iter: T) -> Result<(), OutOfMemory>
    where
        T: IntoIterator<Item = Clause>,
    {
        self.solved = false;
        self.log.extend_clauses(cl_iter)
    }
}

impl<S: Solve + SolveStats + Default> Solve for CheckpointSolver<S> {
    fn signature(&self) -> &'static str {
        self.backend.signature()
    }

    fn solve(&mut self) -> Result<SolverResult, SolverError> {
        self.sync()?;
        let res = self.backend.solve()?;
        self.solved = res == SolverResult::Sat;
        Ok(res)
    }

    fn lit_val(&self, lit: Lit) -> Result<TernaryVal, SolverError> {
        if !self.solved {
            return Err(SolverError::State(SolverState::Input, SolverState::Sat));
        }
        self.backend.lit_val(lit)
    }
}

impl<S: Solve + SolveStats + Default> SolveStats for CheckpointSolver<S> {
    fn stats(&self) -> SolverStats {
        let current = self.backend.stats();
        SolverStats {
            n_sat: self.retired.n_sat + current.n_sat,
            n_unsat: self.retired.n_unsat + current.n_unsat,
            n_terminated: self.retired.n_terminated + current.n_terminated,
            n_clauses: self.log.len(),
            cpu_solve_time: self.retired.cpu_solve_time + current.cpu_solve_time,
            ..current
        }
    }
}

impl<S: Solve + SolveStats + Default> Extend<Clause> for CheckpointSolver<S> {
    fn extend<T: IntoIterator<Item = Clause>>(&mut self, iter: T) {
        self.solved = false;
        self.log.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::CheckpointSolver;
    use crate::{
        clause,
        encodings::CollectClauses,
        instances::{BasicVarManager, Cnf, ManageVars},
        lit,
        solvers::{Solve, SolveStats, SolverError, SolverResult, SolverState, SolverStats},
        types::{Assignment, Clause, Lit, TernaryVal},
        OutOfMemory,
    };

    /// Enumerates all assignments, only for tiny formulas
    #[derive(Default)]
    struct BruteForce {
        cnf: Cnf,
        model: Option<Assignment>,
        n_solves: usize,
        n_sat: usize,
    }

    impl CollectClauses for BruteForce {
        fn n_clauses(&self) -> usize {
            self.cnf.n_clauses()
        }

        fn extend_clauses<T>(&mut self, cl_iter: T) -> Result<(), OutOfMemory>
        where
            T: IntoIterator<Item = Clause>,
        {
            self.model = None;
            self.cnf.extend_clauses(cl_iter)
        }
    }

    impl Solve for BruteForce {
        fn signature(&self) -> &'static str {
            "brute force"
        }

        fn solve(&mut self) -> Result<SolverResult, SolverError> {
            self.n_solves += 1;
            let n_vars = self
                .cnf
                .iter()
                .flat_map(Clause::iter)
                .map(|l| l.vidx32() + 1)
                .max()
                .unwrap_or(0);
            assert!(n_vars <= 16);
            self.model = (0..1u32 << n_vars)
                .map(|bits| {
                    (0..n_vars)
                        .map(|v| Lit::new(v, bits & (1 << v) == 0))
                        .collect::<Assignment>()
                })
                .find(|assign| self.cnf.is_sat(assign));
            Ok(if self.model.is_some() {
                self.n_sat += 1;
                SolverResult::Sat
            } else {
                SolverResult::Unsat
            })
        }

        fn lit_val(&self, lit: Lit) -> Result<TernaryVal, SolverError> {
            match &self.model {
                Some(model) => Ok(model.lit_value(lit)),
                None => Err(SolverError::State(SolverState::Input, SolverState::Sat)),
            }
        }
    }

    impl SolveStats for BruteForce {
        fn stats(&self) -> SolverStats {
            SolverStats {
                n_sat: self.n_sat,
                n_unsat: self.n_solves - self.n_sat,
                n_clauses: self.cnf.n_clauses(),
                ..SolverStats::default()
            }
        }
    }

    #[test]
    fn restore_removes_clauses() {
        let mut solver = CheckpointSolver::<BruteForce>::default();
        let mut vm = BasicVarManager::default();
        let a = vm.new_lit();
        solver.add_unit(a).unwrap();
        assert_eq!(solver.solve().unwrap(), SolverResult::Sat);
        let token = solver.save_state(&vm);
        solver.add_unit(!a).unwrap();
        assert_eq!(solver.solve().unwrap(), SolverResult::Unsat);
        solver.restore_state(token, &mut vm).unwrap();
        assert_eq!(solver.n_clauses(), 1);
        assert_eq!(solver.solve().unwrap(), SolverResult::Sat);
        assert_eq!(solver.lit_val(a).unwrap(), TernaryVal::True);
        assert_eq!(solver.backend().n_clauses(), 1);
    }

    #[test]
    fn unsynced_restore_keeps_backend() {
        let mut solver = CheckpointSolver::<BruteForce>::default();
        let mut vm = BasicVarManager::default();
        solver.add_unit(lit![0]).unwrap();
        solver.solve().unwrap();
        let token = solver.save_state(&vm);
        solver.add_unit(!lit![0]).unwrap();
        solver.restore_state(token, &mut vm).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.backend().n_solves, 2);
        assert_eq!(solver.backend().n_clauses(), 1);
    }

    #[test]
    fn restore_vars() {
        let mut solver = CheckpointSolver::<BruteForce>::default();
        let mut vm = BasicVarManager::default();
        vm.new_lits(3);
        let token = solver.save_state(&vm);
        let d = vm.new_lit();
        assert_eq!(d, lit![3]);
        solver.add_clause(clause![d, lit![0]]).unwrap();
        solver.restore_state(token, &mut vm).unwrap();
        assert_eq!(vm.n_used(), 3);
        assert_eq!(vm.new_lit(), lit![3]);
    }

    #[test]
    fn nested_states() {
        let mut solver = CheckpointSolver::<BruteForce>::default();
        let mut vm = BasicVarManager::default();
        let outer = solver.save_state(&vm);
        solver.add_unit(lit![0]).unwrap();
        let inner = solver.save_state(&vm);
        solver.add_unit(lit![1]).unwrap();
        assert_eq!(solver.n_states(), 2);
        solver.restore_state(outer, &mut vm).unwrap();
        assert_eq!(solver.n_states(), 0);
        assert!(solver.n_clauses() == 0);
        assert!(matches!(
            solver.restore_state(inner, &mut vm),
            Err(SolverError::Api(_))
        ));
        assert!(matches!(
            solver.restore_state(outer, &mut vm),
            Err(SolverError::Api(_))
        ));
    }

    #[test]
    fn stale_token_after_new_save() {
        let mut solver = CheckpointSolver::<BruteForce>::default();
        let mut vm = BasicVarManager::default();
        let first = solver.save_state(&vm);
        solver.restore_state(first, &mut vm).unwrap();
        solver.add_unit(lit![0]).unwrap();
        let second = solver.save_state(&vm);
        assert_eq!(
            solver.restore_state(first, &mut vm),
            Err(SolverError::Api(
                "state token 0 is not on the state stack".to_string()
            ))
        );
        solver.restore_state(second, &mut vm).unwrap();
        assert_eq!(solver.n_clauses(), 1);
    }

    #[test]
    fn no_values_after_change() {
        let mut solver = CheckpointSolver::<BruteForce>::default();
        let mut vm = BasicVarManager::default();
        let a = vm.new_lit();
        let not_solved = Err(SolverError::State(SolverState::Input, SolverState::Sat));
        assert_eq!(solver.lit_val(a), not_solved);
        let token = solver.save_state(&vm);
        solver.add_unit(a).unwrap();
        assert_eq!(solver.solve().unwrap(), SolverResult::Sat);
        assert_eq!(solver.lit_val(a).unwrap(), TernaryVal::True);
        solver.restore_state(token, &mut vm).unwrap();
        assert_eq!(solver.lit_val(a), not_solved);
        solver.add_unit(!a).unwrap();
        assert_eq!(solver.lit_val(a), not_solved);
        assert_eq!(solver.solve().unwrap(), SolverResult::Sat);
        assert_eq!(solver.lit_val(a).unwrap(), TernaryVal::False);
        solver.extend([clause![a]]);
        assert_eq!(solver.lit_val(a), not_solved);
        assert_eq!(solver.solve().unwrap(), SolverResult::Unsat);
        assert_eq!(solver.lit_val(a), not_solved);
    }

    #[test]
    fn stats_survive_rebuild() {
        let mut solver = CheckpointSolver::<BruteForce>::default();
        let mut vm = BasicVarManager::default();
        let token = solver.save_state(&vm);
        solver.add_unit(lit![0]).unwrap();
        solver.solve().unwrap();
        solver.add_unit(!lit![0]).unwrap();
        solver.solve().unwrap();
        solver.restore_state(token, &mut vm).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.backend().n_solves, 1);
        assert_eq!(solver.n_sat_solves(), 2);
        assert_eq!(solver.n_unsat_solves(), 1);
        assert_eq!(solver.n_solves(), 3);
        assert_eq!(solver.stats().n_clauses, 0);
    }
}
