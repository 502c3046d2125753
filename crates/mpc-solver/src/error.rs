//! Error types for solver operations.

use mpc_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur while building or solving a problem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Problem is primal infeasible: {what}")]
    Infeasible { what: String },

    #[error("Problem is unbounded (dual infeasible)")]
    Unbounded,

    #[error(
        "Maximum iterations {iterations} reached (primal residual {primal_residual:.3e}, dual residual {dual_residual:.3e})"
    )]
    MaxIterations {
        iterations: usize,
        primal_residual: f64,
        dual_residual: f64,
    },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SolverError::ProblemSetup { .. } => ErrorKind::Configuration,
            _ => ErrorKind::Solver,
        }
    }
}
