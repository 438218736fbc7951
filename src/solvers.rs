//! # Interfaces to SAT Solvers
//!
//! This module holds the traits the encodings are tested and used against.
//! The main element is the [`Solve`] trait. Every solver is also a clause
//! collector, so encodings can be built directly into a solver.
//!
//! ## Available Solvers
//!
//! ### BatSat
//!
//! [BatSat](https://github.com/c-cube/batsat) is an incremental SAT solver
//! fully implemented in Rust. It is available through the `inccard-batsat`
//! crate.
//!
//! ### Checkpointing
//!
//! [`checkpoint::CheckpointSolver`] wraps any solver and adds snapshots of
//! the clause database and the variable counter that can later be restored.

use core::time::Duration;
use std::fmt;

use thiserror::Error;

use crate::{
    encodings::CollectClauses,
    types::{Assignment, Lit, TernaryVal, Var},
    OutOfMemory,
};

pub mod checkpoint;

/// Trait for all SAT solvers in this library. Clauses are added through the
/// [`CollectClauses`] supertrait.
pub trait Solve: CollectClauses {
    /// Gets a signature of the solver implementation
    #[must_use]
    fn signature(&self) -> &'static str;
    /// Solves the internal CNF formula without any assumptions.
    ///
    /// # Errors
    ///
    /// If the solver is in an invalid state or runs out of memory
    fn solve(&mut self) -> Result<SolverResult, SolverError>;
    /// Gets a solution found by the solver up to a specified highest variable.
    ///
    /// # Errors
    ///
    /// If the solver is not in the satisfied state
    fn solution(&self, high_var: Var) -> Result<Assignment, SolverError> {
        let len = high_var.idx32() + 1;
        let assignment = (0..len)
            .map(|idx| self.lit_val(Lit::positive(idx)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Assignment::from(assignment))
    }
    /// Same as [`Solve::lit_val`], but for variables.
    ///
    /// # Errors
    ///
    /// If the solver is not in the satisfied state
    fn var_val(&self, var: Var) -> Result<TernaryVal, SolverError> {
        self.lit_val(var.pos_lit())
    }
    /// Gets an assignment of a literal in the solver's last solution.
    ///
    /// # Errors
    ///
    /// If the solver is not in the satisfied state
    fn lit_val(&self, lit: Lit) -> Result<TernaryVal, SolverError>;
}

/// Solver statistics
#[derive(Clone, PartialEq, Default, Debug)]
pub struct SolverStats {
    /// The number of satisfiable queries executed
    pub n_sat: usize,
    /// The number of unsatisfiable queries executed
    pub n_unsat: usize,
    /// The number of terminated queries executed
    pub n_terminated: usize,
    /// The number of clauses in the solver
    pub n_clauses: usize,
    /// The highest variable in the solver
    pub max_var: Option<Var>,
    /// The average length of the clauses added to the solver
    pub avg_clause_len: f32,
    /// The total CPU time spent solving
    pub cpu_solve_time: Duration,
}

/// Trait for solvers that track certain statistics. The number of clauses is
/// available through [`CollectClauses::n_clauses`] and
/// [`SolverStats::n_clauses`].
pub trait SolveStats {
    /// Gets the available statistics from the solver
    fn stats(&self) -> SolverStats;
    /// Gets the number of satisfiable queries executed.
    fn n_sat_solves(&self) -> usize {
        self.stats().n_sat
    }
    /// Gets the number of unsatisfiable queries executed.
    fn n_unsat_solves(&self) -> usize {
        self.stats().n_unsat
    }
    /// Gets the number of queries that were prematurely terminated.
    fn n_terminated(&self) -> usize {
        self.stats().n_terminated
    }
    /// Gets the total number of queries executed.
    fn n_solves(&self) -> usize {
        self.n_sat_solves() + self.n_unsat_solves() + self.n_terminated()
    }
    /// Gets the variable with the highest index in the solver, if any.
    fn max_var(&self) -> Option<Var> {
        self.stats().max_var
    }
    /// Get number of variables.
    /// Note: this is only correct if all variables are used in order!
    fn n_vars(&self) -> usize {
        match self.max_var() {
            Some(var) => var.idx() + 1,
            None => 0,
        }
    }
    /// Gets the average length of all clauses in the solver.
    fn avg_clause_len(&self) -> f32 {
        self.stats().avg_clause_len
    }
    /// Gets the total CPU time spent solving.
    fn cpu_solve_time(&self) -> Duration {
        self.stats().cpu_solve_time
    }
}

/// States that the solver can be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverState {
    /// Input state, while adding clauses.
    Input,
    /// The query was found satisfiable.
    Sat,
    /// The query was found unsatisfiable.
    Unsat,
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverState::Input => write!(f, "INPUT"),
            SolverState::Sat => write!(f, "SAT"),
            SolverState::Unsat => write!(f, "UNSAT"),
        }
    }
}

/// Return value for solving queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverResult {
    /// The query was found satisfiable.
    Sat,
    /// The query was found unsatisfiable.
    Unsat,
    /// The query was prematurely interrupted.
    Interrupted,
}

impl fmt::Display for SolverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverResult::Sat => write!(f, "SAT"),
            SolverResult::Unsat => write!(f, "UNSAT"),
            SolverResult::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// Type representing solver errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// An API with a description
    #[error("API error: {0}")]
    Api(String),
    /// The solver was expected to be in the second [`SolverState`], but it is in the first.
    #[error("solvers needs to be in state {1} but was in state {0}")]
    State(SolverState, SolverState),
    /// The solver ran out of memory while adding clauses
    #[error("out of memory")]
    OutOfMemory(#[from] OutOfMemory),
}
