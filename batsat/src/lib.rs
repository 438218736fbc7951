//! # inccard-batsat - Interface to the BatSat SAT Solver for inccard
//!
//! Interface to the [BatSat](https://github.com/c-cube/batsat) incremental SAT-Solver to be used with the `inccard` library.
//!
//! BatSat is fully implemented in Rust which has advantages in restricted compilation scenarios like WebAssembly.
//!
//! # BatSat Version
//!
//! The version of BatSat in this crate is Version 0.6.0.

#![warn(clippy::pedantic)]
#![warn(missing_docs)]

use std::time::Duration;

use batsat::{intmap::AsIndex, lbool, Callbacks, SolverInterface};
use cpu_time::ProcessTime;
use inccard::{
    encodings::CollectClauses,
    solvers::{Solve, SolveStats, SolverError, SolverResult, SolverState, SolverStats},
    types::{Clause, Lit, TernaryVal, Var},
    OutOfMemory,
};

/// inccard wrapper for [`batsat::BasicSolver`]
pub type BasicSolver = Solver<batsat::BasicCallbacks>;

/// inccard wrapper for a [`batsat::Solver`] Solver from BatSat
#[derive(Default)]
pub struct Solver<Cb: Callbacks> {
    internal: batsat::Solver<Cb>,
    /// The result of the last query, reset when clauses are added
    last_result: Option<SolverResult>,
    n_sat: usize,
    n_unsat: usize,
    n_terminated: usize,
    /// Clauses added, including the ones BatSat simplifies away
    n_clauses: usize,
    avg_clause_len: f32,
    cpu_time: Duration,
}

impl<Cb: Callbacks> Solver<Cb> {
    /// Gets a reference to the internal [`BasicSolver`]
    #[must_use]
    pub fn batsat_ref(&self) -> &batsat::Solver<Cb> {
        &self.internal
    }

    /// Gets a mutable reference to the internal [`BasicSolver`]
    #[must_use]
    pub fn batsat_mut(&mut self) -> &mut batsat::Solver<Cb> {
        &mut self.internal
    }

    #[allow(clippy::cast_precision_loss)]
    #[inline]
    fn update_avg_clause_len(&mut self, clause: &Clause) {
        self.avg_clause_len = (self.avg_clause_len * (self.n_clauses as f32)
            + clause.len() as f32)
            / (self.n_clauses + 1) as f32;
    }

    fn add_clause_internal(&mut self, clause: &Clause) {
        self.update_avg_clause_len(clause);
        let mut c: Vec<_> = clause
            .iter()
            .map(|l| batsat::Lit::new(self.internal.var_of_int(l.vidx32() + 1), l.is_pos()))
            .collect();
        self.internal.add_clause_reuse(&mut c);
        self.n_clauses += 1;
        self.last_result = None;
    }

    fn state(&self) -> SolverState {
        match self.last_result {
            Some(SolverResult::Sat) => SolverState::Sat,
            Some(SolverResult::Unsat) => SolverState::Unsat,
            Some(SolverResult::Interrupted) | None => SolverState::Input,
        }
    }

    fn solve_track_stats(&mut self) -> SolverResult {
        let start = ProcessTime::now();
        let ret = match self.internal.solve_limited(&[]) {
            x if x == lbool::TRUE => {
                self.n_sat += 1;
                SolverResult::Sat
            }
            x if x == lbool::FALSE => {
                self.n_unsat += 1;
                SolverResult::Unsat
            }
            x if x == lbool::UNDEF => {
                self.n_terminated += 1;
                SolverResult::Interrupted
            }
            _ => unreachable!(),
        };
        self.cpu_time += start.elapsed();
        self.last_result = Some(ret);
        ret
    }
}

impl<Cb: Callbacks> Extend<Clause> for Solver<Cb> {
    fn extend<T: IntoIterator<Item = Clause>>(&mut self, iter: T) {
        iter.into_iter()
            .for_each(|cl| self.add_clause_internal(&cl));
    }
}

impl<Cb: Callbacks> CollectClauses for Solver<Cb> {
    fn n_clauses(&self) -> usize {
        self.n_clauses
    }

    fn extend_clauses<T>(&mut self, cl_iter: T) -> Result<(), OutOfMemory>
    where
        T: IntoIterator<Item = Clause>,
    {
        self.extend(cl_iter);
        Ok(())
    }
}

impl<Cb: Callbacks> Solve for Solver<Cb> {
    fn signature(&self) -> &'static str {
        "BatSat 0.6.0"
    }

    fn solve(&mut self) -> Result<SolverResult, SolverError> {
        Ok(self.solve_track_stats())
    }

    fn lit_val(&self, lit: Lit) -> Result<TernaryVal, SolverError> {
        if self.last_result != Some(SolverResult::Sat) {
            return Err(SolverError::State(self.state(), SolverState::Sat));
        }
        if lit.vidx32() + 1 >= self.internal.num_vars() {
            // variable never added to the solver
            return Ok(TernaryVal::DontCare);
        }
        let l = batsat::Lit::new(batsat::Var::from_index(lit.vidx() + 1), lit.is_pos());

        match self.internal.value_lit(l) {
            x if x == lbool::TRUE => Ok(TernaryVal::True),
            x if x == lbool::FALSE => Ok(TernaryVal::False),
            x if x == lbool::UNDEF => Ok(TernaryVal::DontCare),
            _ => unreachable!(),
        }
    }
}

impl<Cb: Callbacks> SolveStats for Solver<Cb> {
    fn stats(&self) -> SolverStats {
        SolverStats {
            n_sat: self.n_sat,
            n_unsat: self.n_unsat,
            n_terminated: self.n_terminated,
            n_clauses: self.n_clauses,
            max_var: self.max_var(),
            avg_clause_len: self.avg_clause_len,
            cpu_solve_time: self.cpu_time,
        }
    }

    fn n_sat_solves(&self) -> usize {
        self.n_sat
    }

    fn n_unsat_solves(&self) -> usize {
        self.n_unsat
    }

    fn n_terminated(&self) -> usize {
        self.n_terminated
    }

    fn max_var(&self) -> Option<Var> {
        let num = self.internal.num_vars();
        if num > 1 {
            // BatSat returns a value that is off by one
            Some(Var::new(num - 2))
        } else {
            None
        }
    }

    fn avg_clause_len(&self) -> f32 {
        self.avg_clause_len
    }

    fn cpu_solve_time(&self) -> Duration {
        self.cpu_time
    }
}

#[cfg(test)]
mod test {
    use inccard::{
        clause,
        encodings::CollectClauses,
        lit,
        solvers::{Solve, SolveStats, SolverError, SolverResult, SolverState},
        types::TernaryVal,
        var,
    };

    use super::BasicSolver;

    #[test]
    fn build_destroy() {
        let _solver = BasicSolver::default();
    }

    #[test]
    fn tiny_instance_sat() {
        let mut solver = BasicSolver::default();
        solver.add_binary(!lit![0], lit![1]).unwrap();
        solver.add_unit(lit![0]).unwrap();
        assert_eq!(solver.solve().unwrap(), SolverResult::Sat);
        assert_eq!(solver.lit_val(lit![1]).unwrap(), TernaryVal::True);
        assert_eq!(solver.var_val(var![0]).unwrap(), TernaryVal::True);
        assert_eq!(solver.lit_val(lit![7]).unwrap(), TernaryVal::DontCare);
    }

    #[test]
    fn tiny_instance_unsat() {
        let mut solver = BasicSolver::default();
        solver.add_clause(clause![!lit![0], lit![1]]).unwrap();
        solver.add_unit(lit![0]).unwrap();
        solver.add_unit(!lit![1]).unwrap();
        assert_eq!(solver.solve().unwrap(), SolverResult::Unsat);
        assert_eq!(
            solver.lit_val(lit![0]),
            Err(SolverError::State(SolverState::Unsat, SolverState::Sat))
        );
    }

    #[test]
    fn value_needs_solve() {
        let mut solver = BasicSolver::default();
        solver.add_unit(lit![0]).unwrap();
        assert_eq!(
            solver.lit_val(lit![0]),
            Err(SolverError::State(SolverState::Input, SolverState::Sat))
        );
        solver.solve().unwrap();
        solver.add_unit(lit![1]).unwrap();
        assert!(solver.lit_val(lit![0]).is_err());
    }

    #[test]
    fn stats() {
        let mut solver = BasicSolver::default();
        solver.add_ternary(lit![0], lit![1], lit![2]).unwrap();
        solver.add_unit(lit![3]).unwrap();
        assert_eq!(solver.n_clauses(), 2);
        assert!((solver.avg_clause_len() - 2.0).abs() < f32::EPSILON);
        assert_eq!(solver.max_var(), Some(var![3]));
        solver.solve().unwrap();
        solver.add_unit(!lit![3]).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.n_sat_solves(), 1);
        assert_eq!(solver.n_unsat_solves(), 1);
        assert_eq!(solver.n_solves(), 2);
        assert_eq!(solver.stats().n_clauses, 3);
    }
}
